use std::sync::Arc;

use crate::identity::IdentityProvider;
use crate::media::MediaService;
use crate::store::VaultStore;

/// Shared resource handles, initialized once at process start and handed to
/// every handler. Never recreated per request: re-instantiating the database
/// client under concurrent load exhausts connections.
pub struct AppState {
    pub store: Arc<dyn VaultStore>,
    pub media: Arc<dyn MediaService>,
    pub identity: Arc<dyn IdentityProvider>,
}
