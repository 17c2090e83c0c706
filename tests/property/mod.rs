// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod path_algebra;
