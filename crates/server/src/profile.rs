//! Account profile and broadcast helpers.

use api_types::wallet::{OwnedPaperView, ProfileView, TelegramIds};
use axum::{Extension, Json, extract::State};

use crate::{
    ServerError,
    catalog::map_paper,
    server::{ServerState, TelegramUser},
};

pub async fn get_profile(
    user: Option<Extension<TelegramUser>>,
    State(state): State<ServerState>,
) -> Result<Json<ProfileView>, ServerError> {
    let Some(Extension(TelegramUser(telegram_id))) = user else {
        return Err(ServerError::Generic(
            "telegram-user-id header is required".to_string(),
        ));
    };

    let account = state.engine.get_or_create_account(telegram_id).await?;
    let owned = state.engine.owned_papers(account.id).await?;

    Ok(Json(ProfileView {
        stars: account.stars,
        owned: owned
            .into_iter()
            .map(|entry| OwnedPaperView {
                paper: map_paper(entry.paper),
                granted_at: entry.granted_at,
            })
            .collect(),
    }))
}

pub async fn telegram_ids(
    State(state): State<ServerState>,
) -> Result<Json<TelegramIds>, ServerError> {
    let ids = state.engine.telegram_ids().await?;
    Ok(Json(TelegramIds { ids }))
}
