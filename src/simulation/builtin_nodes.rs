//! Node behaviors shipped with the default project.
//!
//! - [`InertNode`]: does nothing at all.
//! - [`EchoNode`]: answers every data packet to its sender.
//! - [`FloodingNode`]: broadcast flooding, each node forwards the first copy.
//! - [`PingNode`]: pings one target periodically and records the outcome.

use std::any::Any;

use serde_json::{Value, json};

use super::node::{NodeBehavior, NodeContext};
use super::types::{Inbox, NodeId, Round};

#[derive(Debug, Clone, Default)]
pub struct InertNode;

impl NodeBehavior for InertNode {
    fn kind(&self) -> &str {
        "inert"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Replies with the received payload over the same edge.
#[derive(Debug, Clone, Default)]
pub struct EchoNode {
    pub echo_count: u64,
}

impl NodeBehavior for EchoNode {
    fn kind(&self) -> &str {
        "echo"
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: &Inbox) {
        for packet in inbox.data() {
            ctx.send(packet.sender(), packet.payload().clone());
            self.echo_count += 1;
        }
    }

    fn trace_state(&self) -> Value {
        json!({ "echo_count": self.echo_count })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Flooding broadcast. The originator starts in its first active round;
/// every other node re-broadcasts the first copy it hears, once.
#[derive(Debug, Clone, Default)]
pub struct FloodingNode {
    pub originator: bool,
    started: bool,
    /// Round in which the flood reached this node.
    pub reached_at: Option<Round>,
    pub duplicates: u64,
}

impl FloodingNode {
    pub fn new(originator: bool) -> Self {
        FloodingNode {
            originator,
            ..Self::default()
        }
    }
}

impl NodeBehavior for FloodingNode {
    fn kind(&self) -> &str {
        "flooding"
    }

    fn pre_step(&mut self, ctx: &mut NodeContext) {
        if self.originator && !self.started {
            self.started = true;
            self.reached_at = Some(ctx.round());
            ctx.broadcast(json!({ "flood": ctx.id().raw(), "hops": 0 }));
        }
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: &Inbox) {
        for packet in inbox.data() {
            if self.reached_at.is_some() {
                self.duplicates += 1;
                continue;
            }
            self.reached_at = Some(ctx.round());
            let hops = packet.payload().get("hops").and_then(Value::as_u64).unwrap_or(0);
            let mut forwarded = packet.payload().clone();
            if let Some(fields) = forwarded.as_object_mut() {
                fields.insert("hops".to_string(), json!(hops + 1));
            }
            ctx.broadcast(forwarded);
        }
    }

    fn trace_state(&self) -> Value {
        json!({
            "originator": self.originator,
            "reached_at": self.reached_at,
            "duplicates": self.duplicates,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Sends `{"ping": n}` to `target` every `interval` rounds.
#[derive(Debug, Clone)]
pub struct PingNode {
    pub target: Option<NodeId>,
    pub interval: u64,
    pub direct: bool,
    pub sent: u64,
    /// `(round, from)` of every reply heard.
    pub replies: Vec<(Round, NodeId)>,
    pub nacks: u64,
}

impl PingNode {
    pub fn new(target: Option<NodeId>, interval: u64) -> Self {
        PingNode {
            target,
            interval,
            direct: false,
            sent: 0,
            replies: Vec::new(),
            nacks: 0,
        }
    }
}

impl NodeBehavior for PingNode {
    fn kind(&self) -> &str {
        "ping"
    }

    fn check_requirements(&self) -> Result<(), String> {
        if self.target.is_none() {
            return Err("no ping target configured".to_string());
        }
        if self.interval == 0 {
            return Err("ping interval must be at least 1 round".to_string());
        }
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut NodeContext) {
        let Some(target) = self.target else {
            return;
        };
        if target == ctx.id() || ctx.round() % self.interval != 0 {
            return;
        }
        let payload = json!({ "ping": self.sent });
        if self.direct {
            ctx.send_direct(target, payload);
        } else {
            ctx.send(target, payload);
        }
        self.sent += 1;
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: &Inbox) {
        for packet in inbox.iter() {
            if packet.is_nack() {
                self.nacks += 1;
            } else {
                self.replies.push((ctx.round(), packet.sender()));
            }
        }
    }

    fn trace_state(&self) -> Value {
        json!({
            "target": self.target,
            "sent": self.sent,
            "replies": self.replies.len(),
            "nacks": self.nacks,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
