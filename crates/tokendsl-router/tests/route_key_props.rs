//! Property tests for route key parsing and matching.

use proptest::prelude::*;
use tokendsl_router::{HttpMethod, RouteKey, Router, Segment};

fn method() -> impl Strategy<Value = HttpMethod> {
    prop::sample::select(HttpMethod::ALL.to_vec())
}

fn literal() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,12}"
}

fn param_name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

/// A path of up to five segments where parameters are suffixed with their
/// position so names never repeat.
fn path() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            literal().prop_map(|l| (false, l)),
            param_name().prop_map(|p| (true, p)),
        ],
        0..5,
    )
    .prop_map(|segments| {
        if segments.is_empty() {
            return "/".to_string();
        }
        segments
            .into_iter()
            .enumerate()
            .map(|(i, (is_param, text))| {
                if is_param {
                    format!("/:{text}_{i}")
                } else {
                    format!("/{text}")
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn display_parses_back_to_equal_key(method in method(), path in path()) {
        let raw = format!("{method} {path}");
        let key = RouteKey::parse(&raw).unwrap();
        prop_assert_eq!(key.to_string(), raw);
        prop_assert_eq!(RouteKey::parse(&key.to_string()).unwrap(), key);
    }

    #[test]
    fn lowercase_method_is_rejected(method in method(), path in path()) {
        let raw = format!("{} {path}", method.as_lowercase());
        prop_assert!(RouteKey::parse(&raw).is_err());
    }

    #[test]
    fn trailing_slash_is_rejected(method in method(), path in path()) {
        prop_assume!(path != "/");
        let raw = format!("{method} {path}/");
        prop_assert!(RouteKey::parse(&raw).is_err());
    }

    #[test]
    fn concrete_path_captures_every_param(
        method in method(),
        path in path(),
        value in "[a-z0-9]{1,6}",
    ) {
        let key = RouteKey::parse(&format!("{method} {path}")).unwrap();
        let mut router = Router::new();
        router.route(&key, "op").unwrap();

        let concrete: String = key
            .template()
            .segments()
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => format!("/{l}"),
                Segment::Param(_) => format!("/{value}"),
            })
            .collect();
        let concrete = if concrete.is_empty() { "/".to_string() } else { concrete };

        let found = router.match_route(method, &concrete).unwrap();
        for name in key.template().param_names() {
            prop_assert_eq!(found.params.get(name), Some(value.as_str()));
        }
    }
}
