use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, bail};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use agora_core::{CoreCounts, CoreError, PostId, SocialCore};

const TAGS: [&str; 8] = [
    "rust", "music", "chess", "travel", "cooking", "photography", "cycling", "films",
];

const UPVOTE_REWARD: f64 = 1.0;
const COMMENT_REWARD: f64 = 0.5;

/// Shape of a simulation run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationPlan {
    pub users: usize,
    pub threads: usize,
    pub ops_per_thread: usize,
    pub follow_ratio: f64,
    pub seed: u64,
}

impl SimulationPlan {
    fn validate(&self) -> anyhow::Result<()> {
        if self.users < 2 {
            bail!("at least two users are needed, got {}", self.users);
        }
        if self.threads == 0 {
            bail!("at least one thread is needed");
        }
        if !(0.0..=1.0).contains(&self.follow_ratio) {
            bail!("follow ratio must be within [0, 1], got {}", self.follow_ratio);
        }
        Ok(())
    }
}

/// Outcome counts of a simulation run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub plan: SimulationPlan,
    pub follows: usize,
    /// Accepted interactions by kind.
    pub accepted: BTreeMap<String, usize>,
    /// Rejected interactions by error code.
    pub rejected: BTreeMap<String, usize>,
    pub counts: CoreCounts,
    pub first_post_id: u64,
    pub next_post_id: u64,
    pub elapsed_ms: u64,
}

impl SimulationReport {
    pub fn accepted(&self, kind: &str) -> usize {
        self.accepted.get(kind).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[derive(Default)]
struct Tally {
    accepted: BTreeMap<String, usize>,
    rejected: BTreeMap<String, usize>,
}

impl Tally {
    fn record(&mut self, kind: &str, outcome: Result<(), CoreError>) -> anyhow::Result<()> {
        match outcome {
            Ok(()) => *self.accepted.entry(kind.to_string()).or_default() += 1,
            Err(CoreError::Guard(err)) => {
                *self.rejected.entry(err.code().to_string()).or_default() += 1
            }
            Err(other) => return Err(other.into()),
        }
        Ok(())
    }

    fn merge(&mut self, other: Tally) {
        for (k, v) in other.accepted {
            *self.accepted.entry(k).or_default() += v;
        }
        for (k, v) in other.rejected {
            *self.rejected.entry(k).or_default() += v;
        }
    }
}

fn username(i: usize) -> String {
    format!("user{i:03}")
}

/// Register users with random tags and wire a random follow graph.
/// Returns the number of follow edges created.
fn populate(core: &SocialCore, plan: &SimulationPlan, rng: &mut StdRng) -> anyhow::Result<usize> {
    for i in 0..plan.users {
        let count = rng.gen_range(1..=3);
        let tags: Vec<&str> = TAGS.choose_multiple(rng, count).copied().collect();
        core.add_user(&username(i), tags)?;
    }
    let mut follows = 0;
    for a in 0..plan.users {
        for b in 0..plan.users {
            if a != b && rng.gen_bool(plan.follow_ratio) && core.follow(&username(a), &username(b))? {
                follows += 1;
            }
        }
    }
    Ok(follows)
}

fn random_text(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.gen_range(1..=max_len.max(1));
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// One worker's stream of random interactions.
fn drive(core: &SocialCore, plan: &SimulationPlan, worker: usize) -> anyhow::Result<Tally> {
    let mut rng = StdRng::seed_from_u64(plan.seed.wrapping_add(worker as u64 + 1));
    let limits = core.limits();
    let first_id = core.config().next_post_id;
    let mut tally = Tally::default();

    for _ in 0..plan.ops_per_thread {
        let actor = username(rng.gen_range(0..plan.users));
        let issued = core.next_post_id().as_u64();
        let target = if issued > first_id {
            PostId(rng.gen_range(first_id..issued))
        } else {
            PostId(first_id)
        };

        match rng.gen_range(0..100) {
            0..=29 => {
                // Occasionally overshoot the limits to exercise rejections.
                let title = random_text(&mut rng, limits.max_title_len + 2);
                let body = random_text(&mut rng, limits.max_content_len / 10 + 1);
                let outcome = core.create_post(&actor, &title, &body).map(|_| ());
                tally.record("create-post", outcome)?;
            }
            30..=64 => {
                let value = if rng.gen_bool(0.8) { 1 } else { -1 };
                let outcome = core.rate_post(&actor, target, value);
                if outcome.is_ok() && value > 0 {
                    reward_author(core, target, UPVOTE_REWARD, "upvote")?;
                }
                tally.record("rate-post", outcome)?;
            }
            65..=89 => {
                let text = random_text(&mut rng, 40);
                let outcome = core.comment_post(&actor, target, &text);
                if outcome.is_ok() {
                    reward_author(core, target, COMMENT_REWARD, "comment")?;
                }
                tally.record("comment-post", outcome)?;
            }
            _ => {
                let outcome = core.delete_post(&actor, target);
                tally.record("delete-post", outcome)?;
            }
        }
    }
    debug!(worker, accepted = tally.accepted.values().sum::<usize>(), "worker finished");
    Ok(tally)
}

fn reward_author(core: &SocialCore, post: PostId, amount: f64, why: &str) -> anyhow::Result<()> {
    // The post may have been deleted since the interaction landed.
    if let Some(post) = core.get_post(post) {
        core.credit_wallet(post.author.as_str(), amount, &format!("{why} on post #{}", post.id))?;
    }
    Ok(())
}

/// Populate `core` and run `plan.threads` workers against it concurrently.
pub fn run(core: Arc<SocialCore>, plan: SimulationPlan) -> anyhow::Result<SimulationReport> {
    plan.validate()?;
    let started = Instant::now();
    let first_post_id = core.next_post_id().as_u64();

    let mut rng = StdRng::seed_from_u64(plan.seed);
    let follows = populate(&core, &plan, &mut rng)?;
    info!(users = plan.users, follows, threads = plan.threads, "simulation started");

    let plan = Arc::new(plan);
    let handles: Vec<_> = (0..plan.threads)
        .map(|worker| {
            let core = Arc::clone(&core);
            let plan = Arc::clone(&plan);
            thread::spawn(move || drive(&core, &plan, worker))
        })
        .collect();

    let mut tally = Tally::default();
    for handle in handles {
        let worker = handle
            .join()
            .map_err(|_| anyhow!("simulation worker panicked"))??;
        tally.merge(worker);
    }

    let report = SimulationReport {
        plan: plan.as_ref().clone(),
        follows,
        accepted: tally.accepted,
        rejected: tally.rejected,
        counts: core.counts(),
        first_post_id,
        next_post_id: core.next_post_id().as_u64(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        accepted = report.accepted.values().sum::<usize>(),
        rejected = report.total_rejected(),
        posts = report.counts.posts,
        "simulation finished"
    );
    Ok(report)
}
