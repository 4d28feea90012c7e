//! Centralized key registry, one namespace per resource.
//!
//! Every cached read and every invalidation goes through these builders so
//! the prefix relationships stay consistent across the crate: a mutation
//! invalidating `users::all()` is guaranteed to cover every key built by
//! `users::list` and `users::detail`.

use super::key::{Params, QueryKey};

pub mod stats {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("stats")
    }

    pub fn dashboard() -> QueryKey {
        all().with("dashboard")
    }

    pub fn users_over_time(months: u32) -> QueryKey {
        all().with("usersOverTime").with_int(i64::from(months))
    }

    pub fn revenue_over_time(months: u32) -> QueryKey {
        all().with("revenueOverTime").with_int(i64::from(months))
    }

    pub fn recent() -> QueryKey {
        all().with("recent")
    }
}

pub mod residences {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("residences")
    }

    pub fn list(params: Params) -> QueryKey {
        all().with("list").with_params(params)
    }

    pub fn detail(id: &str) -> QueryKey {
        all().with("detail").with(id)
    }
}

pub mod payments {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("payments")
    }

    pub fn list(params: Params) -> QueryKey {
        all().with("list").with_params(params)
    }
}

pub mod users {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("users")
    }

    pub fn list(params: Params) -> QueryKey {
        all().with("list").with_params(params)
    }

    pub fn detail(id: &str) -> QueryKey {
        all().with("detail").with(id)
    }
}

pub mod deletion_requests {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("deletionRequests")
    }

    pub fn list() -> QueryKey {
        all().with("list")
    }
}

pub mod invitations {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("invitations")
    }

    pub fn list(params: Params) -> QueryKey {
        all().with("list").with_params(params)
    }
}

pub mod members {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("members")
    }

    pub fn list(params: Params) -> QueryKey {
        all().with("list").with_params(params)
    }
}

pub mod admin_auth {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("adminAuth")
    }

    pub fn me() -> QueryKey {
        all().with("me")
    }
}

pub mod admin_users {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("adminUsers")
    }

    pub fn list() -> QueryKey {
        all().with("list")
    }
}

pub mod otps {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("otps")
    }

    pub fn list() -> QueryKey {
        all().with("list")
    }
}
