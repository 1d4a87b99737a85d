//! The dependency combiner: a parallel Cartesian join over an ordered list
//! of dependency materializations, producing a stream of [`Combination`]s.
//!
//! `combine` is recursive: the single-dependency base case fans a seed
//! stream out against one dependency and drops empty-match combinations;
//! the two-or-more case computes a pairwise base over the first two
//! dependencies, joins it against the seed (or takes it as the new seed
//! when there is none yet), and recurses on the remaining dependencies.
//! The base and joined stages are built eagerly with `rayon`, then handed
//! to the caller as a [`crossbeam_channel::Receiver`] fed by a single
//! producer thread — the receiver disconnecting *is* the "all producers
//! finished" completion signal.

use std::collections::BTreeMap;

use crossbeam_channel::Receiver;
use rayon::prelude::*;

use combind_key::merge_list;

use crate::combination::Combination;
use crate::search_box::SearchBox;

/// Channel depth for the combiner's output stream. Bounded so a slow
/// consumer (the Virtual build worker pool) applies backpressure to the
/// producer thread rather than buffering an unbounded combination set in
/// memory ahead of demand.
const COMBINER_CHANNEL_DEPTH: usize = 1024;

/// Computes `combine(seed, dependencies)` eagerly and streams the result
/// over a channel.
///
/// `dependencies` is the ordered list `D₁, D₂, … Dₙ` to join; `seed` is
/// the incoming stream of combinations already produced by an earlier
/// call (empty for a component's top-level combiner invocation).
pub fn combine(seed: Vec<Combination>, dependencies: Vec<Vec<SearchBox>>) -> Receiver<Combination> {
    let (tx, rx) = crossbeam_channel::bounded(COMBINER_CHANNEL_DEPTH);
    std::thread::spawn(move || {
        for (count, combination) in combine_to_vec(seed, &dependencies).into_iter().enumerate() {
            if count % 10_000 == 0 {
                tracing::trace!(count, "combiner progress");
            }
            if tx.send(combination).is_err() {
                // Receiver dropped; no further consumer, stop producing.
                break;
            }
        }
        // `tx` drops here, disconnecting the channel and signalling
        // completion to every consumer still reading from `rx`.
    });
    rx
}

/// The recursive core of [`combine`], computed as plain `Vec`s so each
/// stage can be parallelized with `rayon` without threading channel
/// plumbing through the recursion itself.
fn combine_to_vec(seed: Vec<Combination>, dependencies: &[Vec<SearchBox>]) -> Vec<Combination> {
    match dependencies {
        [] => seed,
        [only] => fan_out(&seed, only),
        [first, second, rest @ ..] => {
            let base = pairwise_base(first, second);
            let next_seed = if seed.is_empty() { base } else { join(&base, &seed) };
            combine_to_vec(next_seed, rest)
        }
    }
}

/// `combine(seed, [d])`: fans `seed` out against `d`, dropping any
/// combination whose merged matches are empty.
fn fan_out(seed: &[Combination], dependency: &[SearchBox]) -> Vec<Combination> {
    seed.par_iter()
        .flat_map_iter(|r| {
            dependency.iter().filter_map(move |d| {
                let matches = merge_list(&r.matches, &d.matches);
                if matches.is_empty() {
                    return None;
                }
                let mut types = r.types.clone();
                types.insert(d.r#type.clone(), d.clone());
                Some(Combination::new(types, matches))
            })
        })
        .collect()
}

/// The pairwise base stream over the first two dependencies. Propagates
/// unconditionally — empty-match combinations are *not* dropped here, only
/// in the single-dependency base case.
fn pairwise_base(first: &[SearchBox], second: &[SearchBox]) -> Vec<Combination> {
    first
        .par_iter()
        .flat_map_iter(|di| {
            second.iter().map(move |dj| {
                let mut types = BTreeMap::new();
                types.insert(di.r#type.clone(), di.clone());
                types.insert(dj.r#type.clone(), dj.clone());
                Combination::new(types, merge_list(&di.matches, &dj.matches))
            })
        })
        .collect()
}

/// Joins the base stream against the existing seed: for each `(b, s)` pair,
/// union their `Types` and merge their matches. Propagates unconditionally.
fn join(base: &[Combination], seed: &[Combination]) -> Vec<Combination> {
    base.par_iter()
        .flat_map_iter(|b| {
            seed.iter().map(move |s| {
                let mut types = b.types.clone();
                types.extend(s.types.clone());
                Combination::new(types, merge_list(&b.matches, &s.matches))
            })
        })
        .collect()
}
