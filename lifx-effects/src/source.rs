//! Color sources
//!
//! A [`ColorSource`] turns the previously applied color into the next one.
//! Screen averaging, audio following and picked colors are all sources; the
//! [`EffectRunner`](crate::EffectRunner) does not care which.

use lifx_device::Color;

use crate::error::Result;

/// Producer of the next color for an effect
pub trait ColorSource: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Compute the next color from the one applied last
    fn produce(&mut self, previous: Color) -> Result<Color>;
}

/// Always yields the same color
///
/// Used for colors picked by the user, for example with an eyedropper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticColor(pub Color);

impl ColorSource for StaticColor {
    fn name(&self) -> &str {
        "static"
    }

    fn produce(&mut self, _previous: Color) -> Result<Color> {
        Ok(self.0)
    }
}

/// Closure-backed source, see [`from_fn`]
pub struct FnSource<F> {
    name: String,
    produce: F,
}

/// Wrap a closure as a [`ColorSource`]
///
/// ```rust,ignore
/// let dimmer = lifx_effects::from_fn("dimmer", |previous: Color| {
///     Ok(previous.with_brightness(previous.brightness.saturating_sub(512)))
/// });
/// ```
pub fn from_fn<F>(name: impl Into<String>, produce: F) -> FnSource<F>
where
    F: FnMut(Color) -> Result<Color> + Send,
{
    FnSource {
        name: name.into(),
        produce,
    }
}

impl<F> ColorSource for FnSource<F>
where
    F: FnMut(Color) -> Result<Color> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&mut self, previous: Color) -> Result<Color> {
        (self.produce)(previous)
    }
}

impl<S: ColorSource + ?Sized> ColorSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn produce(&mut self, previous: Color) -> Result<Color> {
        (**self).produce(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EffectError;

    #[test]
    fn test_static_color_ignores_previous() {
        let mut source = StaticColor(Color::new(1, 2, 3, 4000));
        assert_eq!(source.produce(Color::default()).unwrap(), Color::new(1, 2, 3, 4000));
        assert_eq!(source.name(), "static");
    }

    #[test]
    fn test_from_fn_threads_previous_color() {
        let mut source = from_fn("brighten", |previous: Color| {
            Ok(previous.with_brightness(previous.brightness.saturating_add(10)))
        });
        let next = source.produce(Color::new(0, 0, 5, 2500)).unwrap();
        assert_eq!(next.brightness, 15);
        assert_eq!(source.name(), "brighten");
    }

    #[test]
    fn test_boxed_source_delegates() {
        let mut source: Box<dyn ColorSource> = Box::new(from_fn("broken", |_| {
            Err(EffectError::Source("capture failed".to_string()))
        }));
        assert_eq!(source.name(), "broken");
        assert!(source.produce(Color::default()).is_err());
    }
}
