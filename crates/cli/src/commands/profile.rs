//! `profile show` and `profile update`.

use std::io::Write;

use c2c_client::Marketplace;
use c2c_core::{ProfileUpdate, Route};

use super::{CommandResult, reject, require_session};
use crate::render::Renderer;

pub async fn show<W: Write>(market: &Marketplace, out: &mut Renderer<W>) -> CommandResult {
    require_session(market, &Route::Profile).await?;
    match market.fetch_profile().await {
        Ok(profile) => out.profile(&profile)?,
        Err(e) => return Err(reject(out, e)),
    }
    Ok(())
}

pub async fn update<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    update: ProfileUpdate,
) -> CommandResult {
    require_session(market, &Route::Profile).await?;
    if let Err(e) = market.update_profile(&update).await {
        return Err(reject(out, e));
    }
    out.line("Profile updated")?;
    Ok(())
}
