use contacts_auth::Caller;
use contacts_core::OwnerId;

/// Caller context for a request (authenticated identity + admin flag).
///
/// Inserted by the auth middleware; every `/_contacts` handler requires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    caller: Caller,
}

impl CallerContext {
    pub fn new(caller: Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn uid(&self) -> &OwnerId {
        self.caller.uid()
    }

    pub fn is_admin(&self) -> bool {
        self.caller.is_admin()
    }
}
