//! Randomized save harness against the in-memory stores
//!
//! Drives the engine with seeded random rounds of creates, patches and
//! soft-deletes, then checks the invariants the engine is supposed to
//! uphold regardless of input order:
//! - the non-deleted image count never exceeds the configured cap
//! - every record's path pair encodes its derived visibility
//! - every record's path pair resolves in the blob store's live set

use crate::config::SaveConfig;
use crate::engine::ImageReconciler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use vitrine_model::{ProductId, UploadedFile};
use vitrine_store::{
    BlobStore, ImageOrder, ImageRepository, MemoryBlobStore, MemoryImageRepository,
    MemoryProductCatalog,
    MemoryThumbnailer,
};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of bulk-save rounds to run
    pub rounds: u64,
    /// Per-product image cap under test
    pub max_images: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rounds: 200,
            max_images: 10,
        }
    }
}

/// An invariant broken during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// More non-deleted images than the cap allows
    CountExceeded {
        /// Round that produced the excess
        round: u64,
        /// Observed non-deleted count
        count: usize,
        /// Configured cap
        max: usize,
    },
    /// A record's paths disagree with its derived visibility
    PathState {
        /// Round that produced the mismatch
        round: u64,
        /// Description of the offending record
        detail: String,
    },
    /// A record points at a path the blob store does not hold
    DanglingPath {
        /// Round that produced the dangle
        round: u64,
        /// The missing path
        path: String,
    },
}

/// Outcome of a simulator run
#[derive(Debug, Clone, Default)]
pub struct SimulatorReport {
    /// Rounds executed
    pub rounds: u64,
    /// Saves accepted
    pub accepted: u64,
    /// Saves rejected by the count invariant
    pub rejected_limit: u64,
    /// Saves rejected for any other reason
    pub rejected_other: u64,
    /// Records owned by the product at the end
    pub final_records: usize,
    /// Invariants broken along the way
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Whether the run finished with every invariant intact
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Simulator Report");
        let _ = writeln!(out, "  Rounds: {}", self.rounds);
        let _ = writeln!(out, "  Accepted: {}", self.accepted);
        let _ = writeln!(out, "  Rejected (limit): {}", self.rejected_limit);
        let _ = writeln!(out, "  Rejected (other): {}", self.rejected_other);
        let _ = writeln!(out, "  Final records: {}", self.final_records);
        let _ = writeln!(out, "  Violations: {}", self.violations.len());
        for violation in &self.violations {
            let _ = writeln!(out, "    {violation:?}");
        }
        let _ = writeln!(
            out,
            "  Status: {}",
            if self.passed() { "PASSED" } else { "FAILED" }
        );
        out
    }
}

/// Run the simulator to completion
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let repository = Arc::new(MemoryImageRepository::new());
    let catalog = Arc::new(MemoryProductCatalog::new(Arc::clone(&repository)));
    let blobs = Arc::new(MemoryBlobStore::new());
    let product_id = ProductId::new();
    catalog.register(product_id);

    let reconciler = ImageReconciler::with_config(
        catalog,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        Arc::new(MemoryThumbnailer::new()),
        Arc::clone(&repository) as Arc<dyn ImageRepository>,
        SaveConfig::default().with_max_images(config.max_images),
    );

    let mut report = SimulatorReport::default();
    for round in 0..config.rounds {
        report.rounds = round + 1;

        let (files, payload) = random_request(&mut rng, &repository, &product_id).await;
        match reconciler
            .bulk_save(&product_id.to_string(), files, &payload)
            .await
        {
            Ok(_) => report.accepted += 1,
            Err(crate::error::SaveImagesError::LimitExceeded { .. }) => {
                report.rejected_limit += 1;
            }
            Err(_) => report.rejected_other += 1,
        }

        check_invariants(round, &repository, &blobs, &product_id, config.max_images, &mut report)
            .await;
    }

    report.final_records = repository
        .find_all_for_product(&product_id, ImageOrder::default())
        .await
        .map_or(0, |r| r.len());
    report
}

async fn random_request(
    rng: &mut StdRng,
    repository: &Arc<MemoryImageRepository>,
    product_id: &ProductId,
) -> (Option<Vec<UploadedFile>>, serde_json::Value) {
    let existing = repository
        .find_all_for_product(product_id, ImageOrder::default())
        .await
        .unwrap_or_default();

    let mut files = Vec::new();
    let mut items = Vec::new();

    let creates = rng.random_range(0..=3usize);
    for i in 0..creates {
        files.push(UploadedFile::new(
            "images",
            format!("sim-{i}.jpg"),
            "image/jpeg",
            vec![rng.random::<u8>(); 32],
        ));
        items.push(json!({
            "fileIndex": i,
            "active": rng.random_bool(0.5),
            "main": rng.random_bool(0.2),
        }));
    }

    // Sometimes patch or soft-delete a random existing record.
    if !existing.is_empty() && rng.random_bool(0.5) {
        let target = &existing[rng.random_range(0..existing.len())];
        if rng.random_bool(0.4) {
            items.push(json!({ "imageId": target.id.to_string(), "delete": true }));
        } else {
            items.push(json!({
                "imageId": target.id.to_string(),
                "active": rng.random_bool(0.5),
                "name": format!("round-name-{}", rng.random_range(0..100)),
            }));
        }
    }

    let files = (!files.is_empty()).then_some(files);
    (files, json!({ "items": items }))
}

async fn check_invariants(
    round: u64,
    repository: &Arc<MemoryImageRepository>,
    blobs: &Arc<MemoryBlobStore>,
    product_id: &ProductId,
    max_images: usize,
    report: &mut SimulatorReport,
) {
    let records = repository
        .find_all_for_product(product_id, ImageOrder::default())
        .await
        .unwrap_or_default();

    let live = records.iter().filter(|r| !r.is_deleted()).count();
    if live > max_images {
        report.violations.push(Violation::CountExceeded {
            round,
            count: live,
            max: max_images,
        });
    }

    for record in &records {
        let state = record.visibility().as_str();
        if record.original_path.visibility_segment() != Some(state)
            || record.thumbnail_path.visibility_segment() != Some(state)
        {
            report.violations.push(Violation::PathState {
                round,
                detail: format!("record {} is {state} but paths disagree", record.id),
            });
        }
        for path in [&record.original_path, &record.thumbnail_path] {
            if !blobs.contains(path) {
                report.violations.push(Violation::DanglingPath {
                    round,
                    path: path.as_str().to_string(),
                });
            }
        }
    }
}
