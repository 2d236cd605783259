//! Three-step sell wizard.

use crate::types::NewListing;

use super::{ListingForm, ValidationErrors};

/// Steps of the sell wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    /// Title, description and category.
    Details,
    /// Price and city.
    PriceAndLocation,
    /// Image URLs.
    Photos,
}

impl WizardStep {
    /// 1-based step number shown in the progress bar.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Details => 1,
            Self::PriceAndLocation => 2,
            Self::Photos => 3,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Details => "Car Details",
            Self::PriceAndLocation => "Price & Location",
            Self::Photos => "Photos",
        }
    }

    /// Form fields validated before leaving this step.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Details => &["title", "description", "category"],
            Self::PriceAndLocation => &["price", "city"],
            Self::Photos => &["images"],
        }
    }

    const fn following(self) -> Option<Self> {
        match self {
            Self::Details => Some(Self::PriceAndLocation),
            Self::PriceAndLocation => Some(Self::Photos),
            Self::Photos => None,
        }
    }

    const fn preceding(self) -> Option<Self> {
        match self {
            Self::Details => None,
            Self::PriceAndLocation => Some(Self::Details),
            Self::Photos => Some(Self::PriceAndLocation),
        }
    }
}

/// Sell-form state across the three wizard steps.
#[derive(Debug, Clone)]
pub struct ListingWizard {
    form: ListingForm,
    step: WizardStep,
}

impl Default for ListingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingWizard {
    /// A fresh wizard on the first step with one empty image input.
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: ListingForm {
                images: vec![String::new()],
                ..ListingForm::default()
            },
            step: WizardStep::Details,
        }
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub const fn form(&self) -> &ListingForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut ListingForm {
        &mut self.form
    }

    /// Validate the current step's fields and advance when they pass.
    ///
    /// On the last step this only validates.
    ///
    /// # Errors
    ///
    /// Returns the failures for the current step's fields; the step does not
    /// change.
    pub fn next(&mut self) -> Result<WizardStep, ValidationErrors> {
        self.validate_step()?;
        if let Some(next) = self.step.following() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Go back one step without validating.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.preceding() {
            self.step = previous;
        }
        self.step
    }

    /// Append an empty image input.
    pub fn add_image(&mut self) {
        self.form.images.push(String::new());
    }

    /// Replace the image input at `index`. Returns false when out of range.
    pub fn update_image(&mut self, index: usize, url: impl Into<String>) -> bool {
        match self.form.images.get_mut(index) {
            Some(slot) => {
                *slot = url.into();
                true
            }
            None => false,
        }
    }

    /// Remove the image input at `index`. Returns false when out of range.
    pub fn remove_image(&mut self, index: usize) -> bool {
        if index < self.form.images.len() {
            self.form.images.remove(index);
            true
        } else {
            false
        }
    }

    /// Validate the whole form and produce the request body.
    ///
    /// # Errors
    ///
    /// Returns every failing field across all steps.
    pub fn submit(&self) -> Result<NewListing, ValidationErrors> {
        self.form.validate()
    }

    fn validate_step(&self) -> Result<(), ValidationErrors> {
        match self.form.validate() {
            Ok(_) => Ok(()),
            Err(errors) => errors.restricted_to(self.step.fields()).into_result(|| ()),
        }
    }
}
