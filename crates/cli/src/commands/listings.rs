//! `listings` subcommands.

use std::io::Write;

use c2c_client::{DetailView, ListingsView, Marketplace};
use c2c_core::validation::ListingForm;
use c2c_core::{ListingFilters, ListingId, ListingUpdate, Route};

use super::{CommandResult, reject, require_session};
use crate::render::Renderer;

pub async fn browse<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    filters: &ListingFilters,
) -> CommandResult {
    if let Err(e) = market.fetch_listings(filters).await {
        tracing::debug!(error = %e, "Browse failed");
    }
    out.listings(&ListingsView::browse(&market.listings()))?;
    Ok(())
}

pub async fn show<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    id: &ListingId,
) -> CommandResult {
    market.clear_current_listing();
    if let Err(e) = market.fetch_listing(id).await {
        tracing::debug!(error = %e, listing_id = %id, "Detail fetch failed");
    }
    out.detail(&DetailView::from_state(&market.listings()))?;
    Ok(())
}

pub async fn mine<W: Write>(market: &Marketplace, out: &mut Renderer<W>) -> CommandResult {
    require_session(market, &Route::MyListings).await?;
    if let Err(e) = market.fetch_my_listings().await {
        tracing::debug!(error = %e, "My listings fetch failed");
    }
    out.listings(&ListingsView::mine(&market.listings()))?;
    Ok(())
}

pub async fn create<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    form: &ListingForm,
) -> CommandResult {
    require_session(market, &Route::Sell).await?;
    let listing = match market.create_listing(form).await {
        Ok(listing) => listing,
        Err(e) => return Err(reject(out, e)),
    };
    out.line(format_args!(
        "Listed {} as #{} for {}",
        listing.title, listing.listing_id, listing.price
    ))?;
    Ok(())
}

pub async fn update<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    id: &ListingId,
    update: &ListingUpdate,
) -> CommandResult {
    require_session(market, &Route::MyListings).await?;
    if let Err(e) = market.update_listing(id, update).await {
        return Err(reject(out, e));
    }
    out.line(format_args!("Updated listing #{id}"))?;
    Ok(())
}

pub async fn delete<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    id: &ListingId,
) -> CommandResult {
    require_session(market, &Route::MyListings).await?;
    if let Err(e) = market.delete_listing(id).await {
        return Err(reject(out, e));
    }
    out.line(format_args!("Deleted listing #{id}"))?;
    Ok(())
}

/// Credentials for the hosted image uploader used when adding photos.
pub async fn upload_auth<W: Write>(market: &Marketplace, out: &mut Renderer<W>) -> CommandResult {
    require_session(market, &Route::Sell).await?;
    let auth = match market.fetch_upload_auth().await {
        Ok(auth) => auth,
        Err(e) => return Err(reject(out, e)),
    };
    out.upload_auth(&auth)?;
    Ok(())
}
