pub mod auth;
pub mod books;
pub mod reviews;

use std::sync::Arc;

use shelf_authz::TokenKeys;
use shelf_kernel::ModuleRegistry;

use auth::{routes::AuthState, store::UserStore};
use books::store::BookStore;
use reviews::store::ReviewStore;

/// State shared by the books and reviews routers.
#[derive(Clone)]
pub struct CatalogState {
    pub books: Arc<dyn BookStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

/// Everything the modules need, wired once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub tokens: Arc<TokenKeys>,
    pub bcrypt_cost: u32,
}

/// Register every module. Order matters: migrations run in registration
/// order and reviews reference both users and books.
pub fn register_all(registry: &mut ModuleRegistry, ctx: &AppContext) -> anyhow::Result<()> {
    let catalog = CatalogState {
        books: ctx.books.clone(),
        reviews: ctx.reviews.clone(),
    };

    registry.register(auth::create_module(AuthState {
        users: ctx.users.clone(),
        tokens: ctx.tokens.clone(),
        bcrypt_cost: ctx.bcrypt_cost,
    }))?;
    registry.register(books::create_module(catalog.clone(), ctx.tokens.clone()))?;
    registry.register(reviews::create_module(catalog, ctx.tokens.clone()))?;
    Ok(())
}

/// Path ids that are not integers name nothing.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}
