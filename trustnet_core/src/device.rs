//! Device - the forwarding actor living on each node.
//!
//! A device produces pings, answers pings addressed to it with pongs and
//! relays everything else, unless greed makes it drop the packet. The way
//! it picks a relay is pluggable through [`ForwardingPolicy`].
//!
//! # State Machine
//!
//! ```text
//!              ┌──────────── dst == self ────────────┐
//!              │                                     ▼
//!  Idle ──► Deciding ── u >= greed ──► Forward   Deliver (ping → pong)
//!              │                         │
//!              └── u < greed ──► Drop ◄──┘ (no loop-free path)
//! ```
//!
//! Devices never call each other. Each decision returns a [`Step`] and the
//! caller's scheduler moves the message to the next device.

use crate::context::ForwardingContext;
use crate::error::TopologyError;
use crate::message::{Content, Message};
use crate::routing::{plan_route, DropReason, Route};
use crate::selector::{select_next_hop, ForwardingPolicy};
use crate::topology::Topology;
use crate::trust::{TrustFeedback, TrustStore};
use std::collections::BTreeMap;
use tracing::debug;
use trustnet_env::{MessageId, NodeId, RandomSource};

/// Result of one device handling one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Hand the message to neighbor `to`
    Forward { to: NodeId, message: Message },

    /// The message reached its destination; a ping carries the reply's
    /// first step
    Delivered {
        message: Message,
        reply: Option<Box<Step>>,
    },

    /// The message's journey ended here
    Dropped { reason: DropReason, message: Message },
}

/// A forwarding actor.
#[derive(Debug, Clone)]
pub struct Device {
    /// Node this device lives on
    index: NodeId,

    /// Probability of dropping a packet addressed to someone else
    greed: f64,

    /// How a relay is picked among candidate paths
    policy: ForwardingPolicy,

    /// How delivery outcomes update `trust`
    feedback: TrustFeedback,

    /// Reputation of every other node
    trust: TrustStore,

    /// Own pings still waiting for a pong: ping id -> first hop
    outstanding: BTreeMap<MessageId, NodeId>,
}

impl Device {
    /// Creates a device on node `index` of `topology`.
    ///
    /// Trust starts at 0 for every other node. Feedback defaults to the
    /// policy's [`ForwardingPolicy::default_feedback`].
    pub fn new(
        index: NodeId,
        greed: f64,
        policy: ForwardingPolicy,
        topology: &Topology,
    ) -> Result<Self, TopologyError> {
        if !(0.0..=1.0).contains(&greed) {
            return Err(TopologyError::InvalidGreed { node: index, greed });
        }

        Ok(Self {
            index,
            greed,
            policy,
            feedback: policy.default_feedback(),
            trust: TrustStore::new(index, topology.node_ids()),
            outstanding: BTreeMap::new(),
        })
    }

    /// Overrides the trust feedback.
    pub fn with_feedback(mut self, feedback: TrustFeedback) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn index(&self) -> NodeId {
        self.index
    }

    pub fn greed(&self) -> f64 {
        self.greed
    }

    pub fn policy(&self) -> ForwardingPolicy {
        self.policy
    }

    pub fn feedback(&self) -> TrustFeedback {
        self.feedback
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// Returns true if this device never relays.
    pub fn is_black_hole(&self) -> bool {
        self.greed >= 1.0
    }

    /// Number of own pings still waiting for a pong.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Creates a ping to a random other node and forwards it.
    ///
    /// The destination is drawn uniformly from every node except this one.
    /// Returns `None` only if the topology has no other node.
    pub fn produce<C: ForwardingContext>(&mut self, ctx: &mut C) -> Option<Step> {
        let destinations: Vec<NodeId> = ctx
            .topology()
            .node_ids()
            .filter(|&node| node != self.index)
            .collect();

        let pick = ctx.random().index(destinations.len()).ok()?;
        let dst = *destinations.get(pick)?;

        let message = Message::ping(ctx.next_message_id(), self.index, dst);
        ctx.counters_mut().record_ping_sent();
        debug!("node {} produced ping {} for {}", self.index, message.id(), dst);

        Some(self.forward(message, ctx))
    }

    /// Handles a message arriving at this device.
    pub fn receive<C: ForwardingContext>(&mut self, message: Message, ctx: &mut C) -> Step {
        if message.dst() == self.index {
            return match message.content() {
                Content::Ping => {
                    ctx.counters_mut().record_ping_received();
                    let pong = Message::pong(ctx.next_message_id(), &message);
                    let reply = self.forward(pong, ctx);
                    Step::Delivered {
                        message,
                        reply: Some(Box::new(reply)),
                    }
                }
                Content::Pong => {
                    ctx.counters_mut().record_pong_received();
                    self.settle(&message);
                    Step::Delivered {
                        message,
                        reply: None,
                    }
                }
            };
        }

        // Each relay hop is an independent Bernoulli trial with success 1 - greed
        if ctx.random().unit() >= self.greed {
            self.forward(message, ctx)
        } else {
            debug!("node {} ate {} {}", self.index, message.content(), message.id());
            ctx.counters_mut().record_drop(DropReason::Greed);
            Step::Dropped {
                reason: DropReason::Greed,
                message,
            }
        }
    }

    /// Picks the next hop for `message` and stamps this device on it.
    ///
    /// The stamp happens whether the message moves on or is dropped.
    pub fn forward<C: ForwardingContext>(&mut self, mut message: Message, ctx: &mut C) -> Step {
        let next = match plan_route(ctx.topology(), self.index, &message) {
            Ok(Route::Direct(dst)) => Ok(dst),
            Ok(Route::Candidates(paths)) => {
                select_next_hop(self.policy, &paths, &self.trust, ctx.random())
                    .ok_or(DropReason::NoRoute)
            }
            Err(reason) => Err(reason),
        };

        message.postmark(self.index);

        match next {
            Ok(to) => {
                if self.originated(&message) && self.feedback.is_enabled() {
                    self.outstanding.insert(message.id(), to);
                }
                debug!("node {} forwards {} {} to {}", self.index, message.content(), message.id(), to);
                Step::Forward { to, message }
            }
            Err(reason) => {
                debug!("node {} drops {} {}: {}", self.index, message.content(), message.id(), reason);
                ctx.counters_mut().record_drop(reason);
                Step::Dropped { reason, message }
            }
        }
    }

    /// Penalizes the first hop of every ping that never got its pong.
    ///
    /// Called once the network has gone quiet after this device's ping, so
    /// anything still outstanding is lost. Returns the number penalized.
    pub fn expire_outstanding(&mut self) -> usize {
        let expired = std::mem::take(&mut self.outstanding);
        if let TrustFeedback::Enabled { penalty, .. } = self.feedback {
            for &hop in expired.values() {
                self.trust.penalize(hop, penalty);
            }
        }
        expired.len()
    }

    fn originated(&self, message: &Message) -> bool {
        message.content() == Content::Ping && message.src() == self.index
    }

    fn settle(&mut self, pong: &Message) {
        let Some(ping) = pong.in_reply_to() else {
            return;
        };
        if let Some(hop) = self.outstanding.remove(&ping) {
            if let TrustFeedback::Enabled { reward, .. } = self.feedback {
                self.trust.reward(hop, reward);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use crate::topology::TopologySpec;

    fn line3(relay_greed: f64) -> TopologySpec {
        TopologySpec::new()
            .node(0, 0.0)
            .node(1, relay_greed)
            .node(2, 0.0)
            .edge(0, 1)
            .edge(1, 2)
    }

    fn device(ctx: &TestContext, id: u32, greed: f64, policy: ForwardingPolicy) -> Device {
        Device::new(NodeId(id), greed, policy, &ctx.topology).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_greed() {
        let ctx = TestContext::new(&line3(0.0), 1);
        assert!(Device::new(NodeId(0), -0.1, ForwardingPolicy::Uniform, &ctx.topology).is_err());
        assert!(Device::new(NodeId(0), 1.1, ForwardingPolicy::Uniform, &ctx.topology).is_err());
    }

    #[test]
    fn test_new_device_trusts_everyone_neutrally() {
        let ctx = TestContext::new(&line3(0.0), 1);
        let dev = device(&ctx, 1, 0.0, ForwardingPolicy::TrustWeighted);
        assert_eq!(dev.trust().len(), 2);
        assert!(dev.trust().iter().all(|(_, score)| score == 0.0));
    }

    #[test]
    fn test_produce_never_targets_self() {
        let mut ctx = TestContext::new(&line3(0.0), 9);
        let mut dev = device(&ctx, 0, 0.0, ForwardingPolicy::Uniform);

        for _ in 0..200 {
            let Some(Step::Forward { to, message }) = dev.produce(&mut ctx) else {
                panic!("line graph always has a first hop");
            };
            assert_ne!(message.dst(), NodeId(0));
            assert_eq!(to, NodeId(1));
            assert_eq!(message.history(), &[NodeId(0)]);
        }
        assert_eq!(ctx.counters.pings_sent, 200);
    }

    #[test]
    fn test_adjacent_destination_is_direct_regardless_of_trust() {
        let spec = TopologySpec::with_black_holes(4, &[], &[(0, 1), (0, 2), (0, 3), (1, 3), (2, 3)]);
        let mut ctx = TestContext::new(&spec, 4);
        let mut dev = device(&ctx, 0, 0.0, ForwardingPolicy::TrustWeighted);
        for _ in 0..20 {
            dev.trust.penalize(NodeId(3), 1.0);
        }

        for _ in 0..50 {
            let ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(3));
            let step = dev.forward(ping, &mut ctx);
            assert!(matches!(step, Step::Forward { to: NodeId(3), .. }));
        }
    }

    #[test]
    fn test_destination_answers_ping_with_pong() {
        let mut ctx = TestContext::new(&line3(0.0), 2);
        let mut dst = device(&ctx, 2, 0.0, ForwardingPolicy::Uniform);

        let mut ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(2));
        ping.postmark(NodeId(0));
        ping.postmark(NodeId(1));

        let Step::Delivered { message, reply: Some(reply) } = dst.receive(ping, &mut ctx) else {
            panic!("ping should be delivered with a reply");
        };
        assert_eq!(message.history(), &[NodeId(0), NodeId(1)]);

        let Step::Forward { to, message: pong } = *reply else {
            panic!("pong should be forwarded");
        };
        assert_eq!(to, NodeId(1));
        assert_eq!(pong.content(), Content::Pong);
        assert_eq!(pong.dst(), NodeId(0));
        assert_eq!(pong.history(), &[NodeId(2)]);
        assert_eq!(ctx.counters.pings_received, 1);
    }

    #[test]
    fn test_black_hole_eats_relayed_packets() {
        let mut ctx = TestContext::new(&line3(1.0), 3);
        let mut hole = device(&ctx, 1, 1.0, ForwardingPolicy::Uniform);
        assert!(hole.is_black_hole());

        for _ in 0..100 {
            let mut ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(2));
            ping.postmark(NodeId(0));
            let step = hole.receive(ping, &mut ctx);
            assert!(matches!(step, Step::Dropped { reason: DropReason::Greed, .. }));
        }
        assert_eq!(ctx.counters.dropped, 100);
        assert_eq!(ctx.counters.drops_by_reason.greed, 100);
    }

    #[test]
    fn test_black_hole_still_accepts_own_traffic() {
        let mut ctx = TestContext::new(&line3(1.0), 3);
        let mut hole = device(&ctx, 1, 1.0, ForwardingPolicy::Uniform);

        let ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(1));
        assert!(matches!(hole.receive(ping, &mut ctx), Step::Delivered { .. }));
        assert_eq!(ctx.counters.pings_received, 1);
    }

    #[test]
    fn test_greed_drop_rate_converges() {
        let greed = 0.3;
        let mut ctx = TestContext::new(&line3(greed), 1234);
        let mut relay = device(&ctx, 1, greed, ForwardingPolicy::Uniform);
        let trials = 10_000;

        for _ in 0..trials {
            let mut ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(2));
            ping.postmark(NodeId(0));
            relay.receive(ping, &mut ctx);
        }

        let rate = ctx.counters.dropped as f64 / trials as f64;
        // Standard error is ~0.0046; allow four of them
        assert!((rate - greed).abs() < 0.02, "drop rate {}", rate);
    }

    #[test]
    fn test_failed_forward_still_stamps_history() {
        let spec = TopologySpec::with_black_holes(4, &[], &[(0, 1), (1, 2)]);
        let mut ctx = TestContext::new(&spec, 5);
        let mut dev = device(&ctx, 0, 0.0, ForwardingPolicy::Uniform);

        let ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(3));
        let Step::Dropped { reason, message } = dev.forward(ping, &mut ctx) else {
            panic!("isolated destination must drop");
        };
        assert_eq!(reason, DropReason::Disconnected);
        assert_eq!(message.history(), &[NodeId(0)]);
        assert_eq!(ctx.counters.drops_by_reason.disconnected, 1);
    }

    #[test]
    fn test_pong_rewards_first_hop() {
        let mut ctx = TestContext::new(&line3(0.0), 6);
        let mut origin = device(&ctx, 0, 0.0, ForwardingPolicy::TrustWeighted);

        let ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(2));
        let Step::Forward { message: ping, .. } = origin.forward(ping, &mut ctx) else {
            panic!("ping should leave");
        };
        assert_eq!(origin.outstanding(), 1);

        let pong = Message::pong(ctx.next_message_id(), &ping);
        origin.receive(pong, &mut ctx);

        assert_eq!(origin.outstanding(), 0);
        assert_eq!(origin.trust().score(NodeId(1)), 1.0);
        assert_eq!(ctx.counters.pongs_received, 1);
    }

    #[test]
    fn test_lost_ping_penalizes_first_hop() {
        let mut ctx = TestContext::new(&line3(1.0), 6);
        let mut origin = device(&ctx, 0, 0.0, ForwardingPolicy::TrustWeighted);

        let ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(2));
        origin.forward(ping, &mut ctx);

        assert_eq!(origin.expire_outstanding(), 1);
        assert_eq!(origin.trust().score(NodeId(1)), -1.0);
        assert_eq!(origin.expire_outstanding(), 0);
    }

    #[test]
    fn test_disabled_feedback_keeps_trust_flat() {
        let mut ctx = TestContext::new(&line3(0.0), 6);
        let mut origin =
            device(&ctx, 0, 0.0, ForwardingPolicy::TrustWeighted).with_feedback(TrustFeedback::Disabled);

        let ping = Message::ping(ctx.next_message_id(), NodeId(0), NodeId(2));
        let Step::Forward { message: ping, .. } = origin.forward(ping, &mut ctx) else {
            panic!("ping should leave");
        };
        let pong = Message::pong(ctx.next_message_id(), &ping);
        origin.receive(pong, &mut ctx);

        assert_eq!(origin.outstanding(), 0);
        assert_eq!(origin.trust().score(NodeId(1)), 0.0);
    }
}
