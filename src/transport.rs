// Outbound side of the publish/subscribe channel. Delivery of inbound messages is up to the
// owner of the channel: it calls `GameDirectory::process_message` or
// `GameSession::process_message` for every message it receives.

use std::sync::mpsc;

use log::{error, warn};
use serde::Serialize;

use crate::event::Topic;
use crate::internal_error_message;


#[derive(Clone, PartialEq, Debug)]
pub enum OutgoingMessage {
    Subscribe { topic: Topic },
    Publish { topic: Topic, payload: serde_json::Value },
}

// Fire-and-forget: a transport is expected to buffer or replay messages while the connection is
// down. Nothing is reported back to the caller.
pub trait Transport {
    fn subscribe(&self, topic: &Topic);
    fn send(&self, topic: &Topic, payload: serde_json::Value);
}

pub fn publish<T: Serialize>(transport: &dyn Transport, topic: &Topic, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => transport.send(topic, value),
        Err(err) => error!("{}", internal_error_message!("cannot serialize {topic}: {err}")),
    }
}


// Forwards everything into a channel. The receiving end is typically a network thread.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<OutgoingMessage>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<OutgoingMessage>) -> Self { ChannelTransport { tx } }

    fn forward(&self, message: OutgoingMessage) {
        if let Err(mpsc::SendError(message)) = self.tx.send(message) {
            warn!("Transport is closed, message lost: {message:?}");
        }
    }
}

impl Transport for ChannelTransport {
    fn subscribe(&self, topic: &Topic) {
        self.forward(OutgoingMessage::Subscribe { topic: topic.clone() });
    }
    fn send(&self, topic: &Topic, payload: serde_json::Value) {
        self.forward(OutgoingMessage::Publish { topic: topic.clone(), payload });
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::event::{GameId, MovesRequest};

    #[test]
    fn channel_transport_forwards_in_order() {
        let (tx, rx) = mpsc::channel();
        let transport = ChannelTransport::new(tx);
        let id = GameId::new("g1");
        transport.subscribe(&Topic::GameMove(id.clone()));
        publish(&transport, &Topic::GameMovesRequest(id.clone()), &MovesRequest {
            starting_index: 0,
        });
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![
            OutgoingMessage::Subscribe { topic: Topic::GameMove(id.clone()) },
            OutgoingMessage::Publish {
                topic: Topic::GameMovesRequest(id),
                payload: json!({ "startingIndex": 0 }),
            },
        ]);
    }

    #[test]
    fn closed_channel_is_not_fatal() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let transport = ChannelTransport::new(tx);
        transport.send(&Topic::GameRequest, json!("g1"));
    }
}
