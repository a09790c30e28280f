// SPDX-License-Identifier: MIT

pub mod graph;
pub mod research;
pub mod retrieval;
pub mod search;
pub mod server;
