use folio_core::BucketSpec;
use std::collections::HashMap;
use typed_builder::TypedBuilder;

/// Bucket shape per route, with a fallback for routes not listed.
///
/// ```rust
/// use folio_core::BucketSpec;
/// use folio_ratelimit::RouteLimits;
///
/// let limits = RouteLimits::builder()
///     .default_spec(BucketSpec::new(60, 1.0).unwrap())
///     .build()
///     .with_route("shares", BucketSpec::new(5, 0.1).unwrap());
///
/// assert_eq!(limits.spec_for("shares").capacity(), 5);
/// assert_eq!(limits.spec_for("views").capacity(), 60);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RouteLimits {
    default_spec: BucketSpec,
    #[builder(default)]
    routes: HashMap<String, BucketSpec>,
}

impl RouteLimits {
    /// Adds or replaces the spec for `route`.
    pub fn with_route(mut self, route: impl Into<String>, spec: BucketSpec) -> Self {
        self.routes.insert(route.into(), spec);
        self
    }

    pub fn spec_for(&self, route: &str) -> BucketSpec {
        self.routes.get(route).copied().unwrap_or(self.default_spec)
    }
}
