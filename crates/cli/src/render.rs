//! Plain-text rendering of store state.

use std::fmt::Display;
use std::io::{self, Write};

use c2c_client::{DetailView, ListingsView};
use c2c_core::{ListingRecord, Profile, UploadAuth, UserRecord, ValidationErrors};

/// Writes screens to a terminal (or any writer in tests).
pub struct Renderer<W> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn listings(&mut self, view: &ListingsView) -> io::Result<()> {
        match view {
            ListingsView::Loading => self.line("Loading..."),
            ListingsView::Failed(error) => self.line(format_args!("Error: {error}")),
            ListingsView::Empty(message) => self.line(message),
            ListingsView::Items(items) => {
                for listing in items {
                    self.listing_row(listing)?;
                }
                self.line(format_args!("{} listing(s)", items.len()))
            }
        }
    }

    fn listing_row(&mut self, listing: &ListingRecord) -> io::Result<()> {
        let sold = if listing.is_sold() { " [sold]" } else { "" };
        writeln!(
            self.out,
            "{:>8}  {}  {}  {}{sold}",
            listing.listing_id, listing.price, listing.title, listing.city
        )
    }

    pub fn detail(&mut self, view: &DetailView) -> io::Result<()> {
        let listing = match view {
            DetailView::Loading => return self.line("Loading..."),
            DetailView::NotFound(message) => return self.line(message),
            DetailView::Found(listing) => listing,
        };

        self.line(&listing.title)?;
        self.line(format_args!("  Price:    {}", listing.price))?;
        let category = listing
            .known_category()
            .map_or(listing.category.as_str(), |c| c.label());
        self.line(format_args!("  Category: {category}"))?;
        self.line(format_args!("  City:     {}", listing.city))?;
        self.line(format_args!("  Status:   {}", listing.availability))?;
        if let Some(seller) = &listing.full_name {
            self.line(format_args!("  Seller:   {seller}"))?;
        }
        if let Some(created_at) = listing.created_at {
            self.line(format_args!("  Listed:   {}", created_at.format("%Y-%m-%d")))?;
        }
        if !listing.description.is_empty() {
            self.line("")?;
            self.line(&listing.description)?;
        }
        for image in &listing.images {
            self.line(format_args!("  image: {image}"))?;
        }
        Ok(())
    }

    pub fn user(&mut self, user: &UserRecord) -> io::Result<()> {
        match &user.email {
            Some(email) => self.line(format_args!("{} <{email}>", user.display_name())),
            None => self.line(user.display_name()),
        }
    }

    pub fn profile(&mut self, profile: &Profile) -> io::Result<()> {
        self.user(&profile.to_user())?;
        if let Some(location) = profile.location() {
            self.line(format_args!("  Location: {location}"))?;
        }
        if let Some(image) = &profile.profile_image {
            self.line(format_args!("  Photo:    {image}"))?;
        }
        if !profile.is_complete() {
            self.line("  Add your city and country to complete your profile.")?;
        }
        Ok(())
    }

    pub fn upload_auth(&mut self, auth: &UploadAuth) -> io::Result<()> {
        self.line(format_args!("signature: {}", auth.signature))?;
        self.line(format_args!("expire:    {}", auth.expire))?;
        self.line(format_args!("token:     {}", auth.token))
    }

    pub fn validation(&mut self, errors: &ValidationErrors) -> io::Result<()> {
        for error in errors.iter() {
            self.line(format_args!("  {}: {}", error.field, error.message))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Renderer<&mut Vec<u8>>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut Renderer::new(&mut buf)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn listing() -> ListingRecord {
        serde_json::from_value(serde_json::json!({
            "listing_id": "42",
            "title": "Honda City ZX 2020",
            "description": "Automatic, 28,000 km",
            "category": "cars",
            "price": 950_000,
            "city": "Hyderabad",
            "availability": "sold",
            "full_name": "Meera Iyer"
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_listings_message() {
        let text = render(|r| r.listings(&ListingsView::Empty("No listings found")));
        assert_eq!(text, "No listings found\n");
    }

    #[test]
    fn test_listing_rows() {
        let text = render(|r| r.listings(&ListingsView::Items(vec![listing()])));
        assert!(text.contains("₹9,50,000"));
        assert!(text.contains("Honda City ZX 2020"));
        assert!(text.contains("[sold]"));
        assert!(text.ends_with("1 listing(s)\n"));
    }

    #[test]
    fn test_detail() {
        let text = render(|r| r.detail(&DetailView::Found(listing())));
        assert!(text.contains("Category: Cars"));
        assert!(text.contains("Seller:   Meera Iyer"));
        assert!(text.contains("Automatic, 28,000 km"));
    }
}
