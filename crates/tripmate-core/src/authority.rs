// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role assignment at account creation.

use std::collections::HashSet;

use crate::types::normalize_email;

/// Administrator role.
pub const ROLE_ADMIN: &str = "ADMIN";

/// Regular member role.
pub const ROLE_USER: &str = "USER";

/// Maps an identity to the roles it receives when the account is created.
pub trait AuthorityResolver: Send + Sync + 'static {
    /// Returns the roles for a new account with this email.
    fn roles_for(&self, email: &str) -> Vec<String>;
}

/// Grants `ADMIN` to a configured list of emails and `USER` to everyone.
#[derive(Debug, Clone, Default)]
pub struct AdminEmailAuthorityResolver {
    admin_emails: HashSet<String>,
}

impl AdminEmailAuthorityResolver {
    /// Creates a resolver. Emails are compared case-insensitively.
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|e| normalize_email(e.as_ref()))
                .collect(),
        }
    }
}

impl AuthorityResolver for AdminEmailAuthorityResolver {
    fn roles_for(&self, email: &str) -> Vec<String> {
        if self.admin_emails.contains(&normalize_email(email)) {
            vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()]
        } else {
            vec![ROLE_USER.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_email_gets_both_roles() {
        let resolver = AdminEmailAuthorityResolver::new(["Admin@Tripmate.io"]);
        assert_eq!(resolver.roles_for("admin@tripmate.io"), vec!["ADMIN", "USER"]);
        assert_eq!(resolver.roles_for("a@x.com"), vec!["USER"]);
    }
}
