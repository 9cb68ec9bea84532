/// Router Module Index
///
/// Splits the routing surface into security-segregated modules so access
/// control is applied explicitly at the module level rather than per-route
/// by convention. The three modules map directly to the access roles the
/// handlers enforce.

/// Routes open to any client, anonymous included. Read handlers here must
/// keep the approved-only visibility predicate in the repository query.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware; a request only
/// reaches these handlers with a verified identity.
pub mod authenticated;

/// Oversight routes nested under `/admin`. Authentication and the mandatory
/// role check both run inside the handlers via `AuthUser::require_admin`.
pub mod admin;
