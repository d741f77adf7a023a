// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Builtin SQL function definitions
//!
//! Declarations here carry id `0`; the registry assigns stable ids when it
//! loads them.

pub mod aggregate;
pub mod scalar;
