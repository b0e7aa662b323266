//! User identity middleware.

use salvo::prelude::*;
use uuid::Uuid;

use storefront_app::domain::users::UserUuid;

use crate::extensions::*;

/// Header carrying the authenticated user's id.
pub(crate) const USER_ID_HEADER: &str = "x-user-id";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(user) = extract_user_uuid(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid X-User-Id header"));
        ctrl.skip_rest();

        return;
    };

    depot.insert_user_uuid(user);

    ctrl.call_next(req, depot, res).await;
}

fn extract_user_uuid(req: &Request) -> Option<UserUuid> {
    let value = req.headers().get(USER_ID_HEADER)?.to_str().ok()?;

    Uuid::parse_str(value.trim()).ok().map(UserUuid::from_uuid)
}
