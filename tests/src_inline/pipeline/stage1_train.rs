use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::trainer::kmeans::Kmeans;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);
static NAMES: [&str; 2] = ["kills", "deaths"];

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_playerskill_train_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn id(v: u32) -> ClusterId {
    ClusterId::new(v).unwrap()
}

#[test]
fn test_run_stage1_trains_three_clusters() {
    let dir = make_temp_dir();
    let path = dir.join("sessions.csv");
    {
        let mut w = BufWriter::new(File::create(&path).unwrap());
        w.write_all(b"kills,deaths\n9,0\n10,1\n0,9\n1,10\n5,5\n5,4\n")
            .unwrap();
    }

    let schema = FeatureSchema::new(&NAMES, 1).unwrap();
    let params = Stage1Params {
        input: &path,
        schema: &schema,
        options: TelemetryOptions { has_header: true },
    };
    let out = run_stage1(&params, &Kmeans::new(3).with_seed(11)).unwrap();

    assert_eq!(out.telemetry.len(), 6);
    assert_eq!(out.telemetry.lines[0], 2);
    assert_eq!(out.trained.model.centroids().len(), 3);
    assert_eq!(out.trained.assignments.len(), 6);
    assert_eq!(out.trained.assignments[0], out.trained.assignments[1]);
    assert_eq!(out.trained.assignments[2], out.trained.assignments[3]);
    assert_eq!(out.trained.assignments[4], out.trained.assignments[5]);
    assert_ne!(out.trained.assignments[0], out.trained.assignments[2]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_run_stage1_rejects_too_many_clusters() {
    let dir = make_temp_dir();
    let path = dir.join("sessions.csv");
    fs::write(&path, "1,2\n3,4\n").unwrap();

    let schema = FeatureSchema::new(&NAMES, 1).unwrap();
    let params = Stage1Params {
        input: &path,
        schema: &schema,
        options: TelemetryOptions::default(),
    };
    let err = run_stage1(&params, &Kmeans::new(3)).unwrap_err();
    assert!(matches!(
        err,
        crate::error::Error::Model(crate::trainer::ModelError::InvalidClusterCount { .. })
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_cluster_sizes() {
    let assignments = vec![id(1), id(3), id(1), id(2), id(1)];
    assert_eq!(cluster_sizes(&assignments, 3), vec![3, 1, 1]);
    assert_eq!(cluster_sizes(&assignments, 4), vec![3, 1, 1, 0]);
    assert_eq!(cluster_sizes(&[], 2), vec![0, 0]);
}
