// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span helpers shared by the batcher, the caches and the pipeline.

pub(crate) mod spans;
