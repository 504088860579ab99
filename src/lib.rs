// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Provisioning generator for a GitHub monitoring dashboard.
//!
//! Dashwright turns a short declarative configuration, i.e., an access token,
//! a list of repositories, and a server domain, into the provisioning files
//! a Grafana server with the GitHub datasource plugin reads at startup:
//! datasource definitions, dashboards, access-control rules, server settings,
//! and the compose stack that runs it all.
//!
//! # Reconciliation
//!
//! Generation is meant to be re-run. Each run merges the values the
//! configuration owns into whatever already sits in the destination
//! directory, so hand edits outside of owned fields survive. A second run
//! with the same configuration writes nothing. See [`reconcile`] and
//! [`ownership`].
//!
//! # Crate Layout
//!
//! - [`config`] and [`validate`]: load and check user configuration.
//! - [`template`], [`synth`], [`write`], [`reconcile`]: the generation core.
//! - [`setup`], [`remote`], [`stack`]: interactive setup, template cloning,
//!   and container stack control used by the command line tool.

pub mod artifact;
pub mod config;
pub mod inspect;
pub mod ownership;
pub mod path;
pub mod reconcile;
pub mod remote;
pub mod setup;
pub mod stack;
pub mod synth;
pub mod template;
pub mod validate;
pub mod write;
