//! Inbound frame dispatch
//!
//! Decodes a frame, updates registry state under the lock, then invokes
//! handlers with the lock released so they may call back into the client.

use spacebrew_core::{codec, Envelope, RemoteClient, TypedValue};
use tracing::{debug, warn};

use crate::admin::Upsert;
use crate::client::Shared;

/// Decode and dispatch one frame; undecodable frames are dropped
pub(crate) fn handle_frame(shared: &Shared, data: &[u8]) {
    match codec::decode(data) {
        Ok(envelope) => dispatch(shared, envelope),
        Err(e) => warn!("Dropping frame: {}", e),
    }
}

pub(crate) fn dispatch(shared: &Shared, envelope: Envelope) {
    debug!("Received {} envelope", envelope.kind());
    let handlers = &shared.handlers;

    match envelope {
        Envelope::Message(message) => match message.typed_value() {
            TypedValue::Boolean(value) => handlers.boolean(&message.name, value),
            TypedValue::Range(value) => handlers.range(&message.name, value),
            TypedValue::String(value) => handlers.string(&message.name, &value),
            TypedValue::Custom {
                value,
                channel_type,
            } => handlers.custom(&message.name, &value, &channel_type),
        },

        Envelope::Admin(_) => {
            debug!("Admin registration acknowledged");
        }

        Envelope::Remove(removed) => {
            for client in removed {
                handlers.remove_client(&client.name, &client.remote_address);
                shared
                    .state
                    .lock()
                    .admin
                    .remove(&client.name, &client.remote_address);
                handlers.all_client_updates();
            }
        }

        Envelope::Route(update) => {
            debug!("Route update: {}", update.kind);
            handlers.route_update(&update);
        }

        Envelope::Configs(clients) => {
            for client in clients {
                match reconcile(shared, client) {
                    Upsert::New(client) => handlers.new_client(&client),
                    Upsert::Updated(client) => handlers.updated_client(&client),
                }
                handlers.all_client_updates();
            }
        }

        Envelope::Unrecognized(frame) => {
            debug!("Ignoring unrecognized frame: {}", frame);
        }
    }
}

fn reconcile(shared: &Shared, client: RemoteClient) -> Upsert {
    let mut guard = shared.state.lock();
    let state = &mut *guard;
    state.admin.reconcile(&state.config, client)
}
