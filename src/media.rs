use anyhow::Context;
use uuid::Uuid;

use crate::auth::dto::FileUpload;
use crate::state::AppState;
use crate::storage::StoredMedia;

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Push an avatar file to the media host under a per-user key.
pub async fn upload_avatar(
    st: &AppState,
    user_id: Uuid,
    file: &FileUpload,
) -> anyhow::Result<StoredMedia> {
    let ext = ext_from_mime(&file.content_type).unwrap_or("bin");
    let key = format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    st.storage
        .upload(&key, file.body.clone(), &file.content_type)
        .await
        .with_context(|| format!("upload avatar {}", key))
}

/// Best-effort removal of a replaced avatar object. The placeholder is not
/// a stored object and must never be deleted.
pub async fn remove_avatar(st: &AppState, avatar_id: &str) {
    if avatar_id == st.config.avatar_placeholder_id {
        return;
    }
    if let Err(e) = st.storage.delete(avatar_id).await {
        tracing::warn!(error = %e, %avatar_id, "failed to delete replaced avatar");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[tokio::test]
    async fn avatar_keys_are_namespaced_per_user() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let file = FileUpload {
            body: Bytes::from_static(b"fake-image"),
            content_type: "image/png".into(),
        };
        let media = upload_avatar(&state, user_id, &file).await.unwrap();
        assert!(media.id.starts_with(&format!("avatars/{}/", user_id)));
        assert!(media.id.ends_with(".png"));
        assert!(media.url.contains(&media.id));
    }

    #[tokio::test]
    async fn placeholder_is_never_deleted() {
        // remove_avatar must early-return on the placeholder id; with the
        // fake store any other id would also succeed, so this just exercises
        // the guard path.
        let state = AppState::fake();
        remove_avatar(&state, "avatar-default").await;
        remove_avatar(&state, "avatars/u/obj.png").await;
    }
}
