// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_attributes;
mod test_editor;
mod test_hit;
mod test_layout;
mod test_rules;
mod utils;
