//! Route label helpers.

use uuid::Uuid;

/// Replace uuid path segments with `{uuid}` so metrics and spans share one
/// label per route.
pub(super) fn normalise_route(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut normalised = String::from("/");

    for (index, segment) in path.trim_start_matches('/').split('/').enumerate() {
        if index > 0 {
            normalised.push('/');
        }

        if Uuid::parse_str(segment).is_ok() {
            normalised.push_str("{uuid}");
        } else {
            normalised.push_str(segment);
        }
    }

    normalised
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_segments_are_replaced() {
        let order = Uuid::now_v7();

        assert_eq!(
            normalise_route(&format!("/orders/{order}/cancel")),
            "/orders/{uuid}/cancel"
        );
        assert_eq!(normalise_route("/cart/items"), "/cart/items");
        assert_eq!(normalise_route("/"), "/");
    }
}
