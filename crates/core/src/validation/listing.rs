//! Listing creation schema.

use url::Url;

use crate::types::{Category, ListingUpdate, NewListing, Price, PriceError};

use super::{ValidationErrors, length_between, required};

/// Raw sell-form input. Every field is text, exactly as typed.
#[derive(Debug, Clone)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub city: String,
    /// Image URL inputs; blank entries are ignored.
    pub images: Vec<String>,
}

impl Default for ListingForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: Category::default().to_string(),
            price: String::new(),
            city: String::new(),
            images: Vec::new(),
        }
    }
}

impl ListingForm {
    /// Image inputs with blank entries removed.
    pub fn filled_images(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
    }

    /// # Errors
    ///
    /// Returns the first failing rule for every invalid field.
    pub fn validate(&self) -> Result<NewListing, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required(&mut errors, "title", &self.title, "Title is required");
        length_between(
            &mut errors,
            "title",
            title,
            Some((10, "Title must be at least 10 characters")),
            Some((100, "Title must be less than 100 characters")),
        );

        let description = required(
            &mut errors,
            "description",
            &self.description,
            "Description is required",
        );
        length_between(
            &mut errors,
            "description",
            description,
            Some((20, "Description must be at least 20 characters")),
            Some((1000, "Description must be less than 1000 characters")),
        );

        let category_text = required(
            &mut errors,
            "category",
            &self.category,
            "Category is required",
        );
        let category = category_text.parse::<Category>().ok();
        if category.is_none() && !category_text.is_empty() {
            errors.add("category", "Please choose a valid category");
        }

        let price = match parse_price(&self.price) {
            Ok(price) => Some(price),
            Err(err) => {
                errors.add("price", err.to_string());
                None
            }
        };

        let city = required(&mut errors, "city", &self.city, "City is required");

        let mut images = Vec::new();
        for raw in self.filled_images() {
            match parse_image_url(raw) {
                Some(url) => images.push(url),
                None => errors.add("images", "Must be a valid URL"),
            }
        }
        if images.is_empty() {
            errors.add("images", "At least one image is required");
        }

        match (category, price) {
            (Some(category), Some(price)) if errors.is_empty() => Ok(NewListing {
                title: title.to_owned(),
                description: description.to_owned(),
                category,
                price,
                city: city.to_owned(),
                images,
            }),
            _ => Err(errors),
        }
    }
}

/// Check the fields present in a partial update against the listing schema.
///
/// # Errors
///
/// Returns a failure for every present field that breaks a listing rule, or
/// a single `update` failure when nothing would change.
pub fn validate_update(update: &ListingUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if update.is_empty() {
        errors.add("update", "Nothing to update");
        return Err(errors);
    }

    if let Some(title) = update.title.as_deref() {
        let title = required(&mut errors, "title", title, "Title is required");
        length_between(
            &mut errors,
            "title",
            title,
            Some((10, "Title must be at least 10 characters")),
            Some((100, "Title must be less than 100 characters")),
        );
    }
    if let Some(description) = update.description.as_deref() {
        let description = required(
            &mut errors,
            "description",
            description,
            "Description is required",
        );
        length_between(
            &mut errors,
            "description",
            description,
            Some((20, "Description must be at least 20 characters")),
            Some((1000, "Description must be less than 1000 characters")),
        );
    }
    if let Some(price) = update.price
        && let Err(err) = Price::checked(price.amount())
    {
        errors.add("price", err.to_string());
    }
    if let Some(city) = update.city.as_deref() {
        required(&mut errors, "city", city, "City is required");
    }
    if update.images.as_ref().is_some_and(Vec::is_empty) {
        errors.add("images", "At least one image is required");
    }

    errors.into_result(|| ())
}

/// Blank price input coerces to zero, which then fails the minimum.
fn parse_price(raw: &str) -> Result<Price, PriceError> {
    if raw.trim().is_empty() {
        return Err(PriceError::TooLow);
    }
    Price::parse(raw)
}

fn parse_image_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}
