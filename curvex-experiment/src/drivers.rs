use crate::error::ConfigError;
use curvex_core::{AdjustableDriver, DashedDriver, StimulusDriver, TextPanel, Visibility};
use log::error;

/// Every collaborator the controller talks to, resolved before it starts.
pub struct Drivers {
    /// Rotating solid reference curve.
    pub reference: Box<dyn StimulusDriver>,
    pub dashed: Box<dyn DashedDriver>,
    pub arrow: Box<dyn StimulusDriver>,
    /// Curve the participant adjusts.
    pub preview: Box<dyn AdjustableDriver>,
    /// Static shapes shown once during the introduction.
    pub demo: Box<dyn Visibility>,
    pub text: Box<dyn TextPanel>,
}

impl Drivers {
    /// Hides every trial stimulus. Text and demo shapes are left alone.
    pub fn hide_stimuli(&mut self) {
        self.reference.hide();
        self.preview.hide();
        self.arrow.hide();
        self.dashed.hide();
    }
}

#[derive(Default)]
pub struct DriversBuilder {
    reference: Option<Box<dyn StimulusDriver>>,
    dashed: Option<Box<dyn DashedDriver>>,
    arrow: Option<Box<dyn StimulusDriver>>,
    preview: Option<Box<dyn AdjustableDriver>>,
    demo: Option<Box<dyn Visibility>>,
    text: Option<Box<dyn TextPanel>>,
}

impl DriversBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(mut self, driver: impl StimulusDriver + 'static) -> Self {
        self.reference = Some(Box::new(driver));
        self
    }

    pub fn dashed(mut self, driver: impl DashedDriver + 'static) -> Self {
        self.dashed = Some(Box::new(driver));
        self
    }

    pub fn arrow(mut self, driver: impl StimulusDriver + 'static) -> Self {
        self.arrow = Some(Box::new(driver));
        self
    }

    pub fn preview(mut self, driver: impl AdjustableDriver + 'static) -> Self {
        self.preview = Some(Box::new(driver));
        self
    }

    pub fn demo(mut self, driver: impl Visibility + 'static) -> Self {
        self.demo = Some(Box::new(driver));
        self
    }

    pub fn text(mut self, panel: impl TextPanel + 'static) -> Self {
        self.text = Some(Box::new(panel));
        self
    }

    pub fn build(self) -> Result<Drivers, ConfigError> {
        fn require<T>(slot: Option<T>, name: &'static str) -> Result<T, ConfigError> {
            slot.ok_or_else(|| {
                error!("required driver `{}` is not assigned", name);
                ConfigError::MissingDriver(name)
            })
        }

        Ok(Drivers {
            reference: require(self.reference, "reference")?,
            dashed: require(self.dashed, "dashed")?,
            arrow: require(self.arrow, "arrow")?,
            preview: require(self.preview, "preview")?,
            demo: require(self.demo, "demo")?,
            text: require(self.text, "text")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curvex_core::{AdjustParams, TrialSpec};

    struct Null;

    impl Visibility for Null {
        fn show(&mut self) {}
        fn hide(&mut self) {}
    }
    impl StimulusDriver for Null {
        fn reset_to(&mut self, _spec: &TrialSpec) {}
    }
    impl DashedDriver for Null {
        fn start_motion(&mut self) {}
        fn stop_motion(&mut self) {}
    }
    impl AdjustableDriver for Null {
        fn current_params(&self) -> AdjustParams {
            AdjustParams::RESET
        }
    }
    impl TextPanel for Null {
        fn display(&mut self, _text: &str) {}
        fn clear(&mut self) {}
    }

    #[test]
    fn complete_set_builds() {
        let drivers = DriversBuilder::new()
            .reference(Null)
            .dashed(Null)
            .arrow(Null)
            .preview(Null)
            .demo(Null)
            .text(Null)
            .build();
        assert!(drivers.is_ok());
    }

    #[test]
    fn missing_driver_is_named() {
        let err = DriversBuilder::new()
            .reference(Null)
            .dashed(Null)
            .preview(Null)
            .demo(Null)
            .text(Null)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingDriver("arrow")));
    }
}
