//! Core analysis and orchestration engine.
//!
//! Dependency order, leaves first: [`invoker`] wraps the external
//! measurement binary; [`normalizer`] prepares assets for it;
//! [`analyzers`] is the independent analyzer suite built on both;
//! [`classification`] aggregates analyzer signals into constraints;
//! [`conflict`] validates parameter sets before they reach the
//! [`queue`] engine, which drives [`delivery`] and [`catalog`]; [`events`]
//! carries progress out of the queue to any subscriber.

pub mod analyzers;
pub mod catalog;
pub mod classification;
pub mod conflict;
pub mod delivery;
pub mod events;
pub mod invoker;
pub mod normalizer;
pub mod queue;
pub mod types;
