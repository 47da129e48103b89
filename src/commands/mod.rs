// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod businesses;
pub mod categories;
pub mod costs;
pub mod products;
pub mod reports;
pub mod importer;
pub mod exporter;
pub mod settings;
pub mod doctor;
