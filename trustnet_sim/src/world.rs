//! SimWorld - The simulation harness container.
//!
//! Owns every device, the per-run context and the mailboxes messages wait
//! in between hops. A round asks each device, in node-id order, to produce
//! one ping; the world then moves that ping (and its pong) hop by hop until
//! both have been delivered or dropped before the next device produces.

use crate::context::SimContext;
use crate::error::SimError;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trustnet_core::{
    Content, DeliveryCounters, Device, DropReason, ForwardingContext, ForwardingPolicy, Message,
    Reliability, Step, Topology, TopologySpec, TrustFeedback,
};
use trustnet_env::{MessageId, NodeId};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of rounds; each device produces one ping per round
    pub rounds: usize,

    /// Longest relay history a message may arrive with; longer ones are
    /// dropped on arrival
    pub max_hops: usize,

    /// Forwarding policy shared by every device
    pub policy: ForwardingPolicy,

    /// Trust feedback override (`None` = the policy's default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<TrustFeedback>,

    /// Keep a trace of every finished message
    pub record_traces: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rounds: 100,
            max_hops: 64,
            policy: ForwardingPolicy::TrustWeighted,
            feedback: None,
            record_traces: false,
        }
    }
}

impl SimConfig {
    /// Feedback the devices actually run with.
    pub fn effective_feedback(&self) -> TrustFeedback {
        self.feedback
            .unwrap_or_else(|| self.policy.default_feedback())
    }
}

/// How a message's journey ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TraceOutcome {
    Delivered,
    Dropped { reason: DropReason },
}

/// Final state of one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTrace {
    pub id: MessageId,
    pub src: NodeId,
    pub dst: NodeId,
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<MessageId>,
    /// Nodes that handled the message, origin first
    pub history: Vec<NodeId>,
    #[serde(flatten)]
    pub outcome: TraceOutcome,
}

impl MessageTrace {
    fn new(message: &Message, outcome: TraceOutcome) -> Self {
        Self {
            id: message.id(),
            src: message.src(),
            dst: message.dst(),
            content: message.content(),
            in_reply_to: message.in_reply_to(),
            history: message.history().to_vec(),
            outcome,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.outcome == TraceOutcome::Delivered
    }
}

/// Mean trust the network ended up placing in each class of node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustSummary {
    /// Mean score held for black holes (`None` if there are none)
    pub black_holes: Option<f64>,

    /// Mean score held for honest nodes
    pub honest: Option<f64>,
}

impl TrustSummary {
    fn from_devices(devices: &BTreeMap<NodeId, Device>) -> Self {
        let (mut bad, mut bad_n, mut good, mut good_n) = (0.0, 0usize, 0.0, 0usize);

        for device in devices.values() {
            for (peer, score) in device.trust().iter() {
                match devices.get(&peer).map(Device::is_black_hole) {
                    Some(true) => {
                        bad += score;
                        bad_n += 1;
                    }
                    Some(false) => {
                        good += score;
                        good_n += 1;
                    }
                    None => {}
                }
            }
        }

        Self {
            black_holes: (bad_n > 0).then(|| bad / bad_n as f64),
            honest: (good_n > 0).then(|| good / good_n as f64),
        }
    }
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub rounds: usize,
    pub counters: DeliveryCounters,
    pub reliability: Reliability,
    pub trust: TrustSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<MessageTrace>,
}

/// The SimWorld - container for the entire simulation.
///
/// Lifecycle: `new` builds the context, `run` (or repeated `run_round`)
/// mutates it, `finish` consumes the world and hands back the counters.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Per-run context (topology, counters, random source)
    context: SimContext,

    /// Devices keyed by node
    devices: BTreeMap<NodeId, Device>,

    /// Messages waiting at each node
    mailboxes: BTreeMap<NodeId, VecDeque<Message>>,

    /// Nodes with mail, in arrival order
    ready: VecDeque<NodeId>,

    /// Finished messages (only with `record_traces`)
    traces: Vec<MessageTrace>,

    /// Rounds completed so far
    rounds_run: usize,
}

impl SimWorld {
    /// Creates a new simulation world over the described network.
    pub fn new(config: SimConfig, spec: &TopologySpec) -> Result<Self, SimError> {
        if config.max_hops == 0 {
            return Err(SimError::config("max_hops must be at least 1"));
        }

        let feedback = config.effective_feedback();
        if let TrustFeedback::Enabled { reward, penalty } = feedback {
            if !reward.is_finite() || !penalty.is_finite() {
                return Err(SimError::config(format!(
                    "trust feedback must be finite (reward={}, penalty={})",
                    reward, penalty
                )));
            }
        }

        let topology = Arc::new(spec.build()?);

        let mut devices = BTreeMap::new();
        for node in &spec.nodes {
            let device =
                Device::new(node.id, node.greed, config.policy, &topology)?.with_feedback(feedback);
            devices.insert(node.id, device);
        }

        warn_on_degenerate(&topology, &devices);

        info!(
            "World ready: {} nodes, {} links, {} black holes, policy={}",
            topology.node_count(),
            topology.edge_count(),
            devices.values().filter(|d| d.is_black_hole()).count(),
            config.policy
        );

        Ok(Self {
            context: SimContext::new(config.seed, topology),
            config,
            devices,
            mailboxes: BTreeMap::new(),
            ready: VecDeque::new(),
            traces: Vec::new(),
            rounds_run: 0,
        })
    }

    /// Runs the remaining configured rounds.
    pub fn run(&mut self) -> Reliability {
        while self.rounds_run < self.config.rounds {
            self.run_round();
        }

        let counters = self.context.counters();
        info!(
            "Run complete: {} rounds | pings {}/{} | pongs {} | dropped {}",
            self.rounds_run,
            counters.pings_received,
            counters.pings_sent,
            counters.pongs_received,
            counters.dropped
        );
        counters.reliability()
    }

    /// Lets every device produce one ping, in node-id order.
    pub fn run_round(&mut self) {
        let producers: Vec<NodeId> = self.devices.keys().copied().collect();
        for origin in producers {
            self.exchange(origin);
        }
        self.rounds_run += 1;
        debug!("round {} done, {} messages so far", self.rounds_run, self.context.messages_created());
    }

    /// Consumes the world, returning the run's results.
    pub fn finish(self) -> RunOutcome {
        let counters = *self.context.counters();
        RunOutcome {
            rounds: self.rounds_run,
            counters,
            reliability: counters.reliability(),
            trust: TrustSummary::from_devices(&self.devices),
            traces: self.traces,
        }
    }

    pub fn rounds_run(&self) -> usize {
        self.rounds_run
    }

    pub fn counters(&self) -> &DeliveryCounters {
        self.context.counters()
    }

    pub fn device(&self, id: NodeId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn traces(&self) -> &[MessageTrace] {
        &self.traces
    }

    /// Network the world runs on.
    pub fn topology(&self) -> Arc<Topology> {
        self.context.shared_topology()
    }

    /// One ping from `origin` plus whatever it triggers, until quiet.
    fn exchange(&mut self, origin: NodeId) {
        let step = match self.devices.get_mut(&origin) {
            Some(device) => device.produce(&mut self.context),
            None => return,
        };
        if let Some(step) = step {
            self.settle(step);
        }

        self.drain();

        // Nothing is in flight, so an unanswered ping is lost for good
        if let Some(device) = self.devices.get_mut(&origin) {
            let lost = device.expire_outstanding();
            if lost > 0 {
                debug!("node {} gave up on {} ping(s)", origin, lost);
            }
        }
    }

    fn drain(&mut self) {
        while let Some(node) = self.ready.pop_front() {
            let Some(message) = self.mailboxes.get_mut(&node).and_then(VecDeque::pop_front) else {
                continue;
            };

            if message.hops() > self.config.max_hops {
                debug!("{} {} exceeded {} hops at node {}", message.content(), message.id(), self.config.max_hops, node);
                self.context.counters_mut().record_drop(DropReason::HopLimit);
                self.record(&message, TraceOutcome::Dropped { reason: DropReason::HopLimit });
                continue;
            }

            let step = match self.devices.get_mut(&node) {
                Some(device) => device.receive(message, &mut self.context),
                None => {
                    self.context.counters_mut().record_drop(DropReason::NoRoute);
                    Step::Dropped {
                        reason: DropReason::NoRoute,
                        message,
                    }
                }
            };
            self.settle(step);
        }
    }

    fn settle(&mut self, step: Step) {
        match step {
            Step::Forward { to, message } => {
                self.mailboxes.entry(to).or_default().push_back(message);
                self.ready.push_back(to);
            }
            Step::Delivered { message, reply } => {
                self.record(&message, TraceOutcome::Delivered);
                if let Some(reply) = reply {
                    self.settle(*reply);
                }
            }
            Step::Dropped { reason, message } => {
                self.record(&message, TraceOutcome::Dropped { reason });
            }
        }
    }

    fn record(&mut self, message: &Message, outcome: TraceOutcome) {
        if self.config.record_traces {
            self.traces.push(MessageTrace::new(message, outcome));
        }
    }
}

fn warn_on_degenerate(topology: &Topology, devices: &BTreeMap<NodeId, Device>) {
    for (&id, device) in devices {
        let neighbors: Vec<NodeId> = topology.neighbors(id).collect();
        if neighbors.is_empty() {
            warn!("⚠ node {} has no links; all its traffic will be dropped", id);
        } else if !device.is_black_hole()
            && neighbors
                .iter()
                .all(|n| devices.get(n).map_or(false, Device::is_black_hole))
        {
            warn!("⚠ every relay around node {} is a black hole", id);
        }
    }
}
