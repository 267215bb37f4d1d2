// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contact book bridge — ContactsContract through the
// `io/tether/android/TetherContacts` peer.
//
// The peer flattens the provider's tables into one JSON array per fetch;
// change notifications arrive through a registered ContentObserver.

use std::sync::Arc;

use tether_core::Contact;
use tether_link::handle::{registry, PeerHandle};
use tether_link::notify::{Notifier, Subscription};
use tracing::warn;

use crate::traits::ContactsBackend;

pub(crate) struct ContactsShared {
    pub(crate) changed: Notifier<()>,
}

/// Read access to the device contact book.
pub struct ContactBook {
    shared: Arc<ContactsShared>,
    backend: Box<dyn ContactsBackend>,
}

impl ContactBook {
    pub fn new() -> Self {
        let shared = Arc::new(ContactsShared {
            changed: Notifier::new(),
        });
        let backend = make_backend(&shared);
        Self { shared, backend }
    }

    /// The full contact list. Empty on any failure — a denied permission or
    /// a peer fault degrades to "no contacts", never an error.
    pub fn contacts(&self) -> Vec<Contact> {
        let json = match self.backend.fetch_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "contact fetch failed");
                return Vec::new();
            }
        };
        match serde_json::from_str(&json) {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!(error = %e, "contact list failed to deserialize");
                Vec::new()
            }
        }
    }

    /// Notified when the platform reports any change to the contact tables.
    pub fn on_changed(&self, f: impl Fn(&()) + Send + Sync + 'static) -> Subscription {
        self.shared.changed.subscribe(f)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        self.shared.changed.unsubscribe(sub);
    }
}

impl Default for ContactBook {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend(shared: &Arc<ContactsShared>) -> Box<dyn ContactsBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidContacts::link(shared))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = shared;
        Box::new(crate::stub::StubContacts)
    }
}

/// Route a contact-table change notification from the boundary.
pub fn dispatch_contacts_changed(handle: PeerHandle) {
    let Some(shared) = registry().resolve::<ContactsShared>(handle) else {
        return;
    };
    shared.changed.emit(&());
}
