//! Full annotation cycle through the CLI: train until the loop pauses,
//! write selection files like an annotator would, resume to completion.

use anotar::cli::{parse_args, run_command};
use anotar::hitl::{load_epoch_state, load_mask, read_rects_csv, write_rects_csv};
use image::{GrayImage, Luma};
use std::path::Path;
use tempfile::tempdir;

const SIDE: u32 = 8;

fn run(args: &[&str]) {
    let cli = parse_args(args.iter().copied()).expect("arguments should parse");
    run_command(cli).expect("command should succeed");
}

/// Two-class image folder: class 0 bright on top, class 1 bright below.
fn write_images(dir: &Path, n: usize) {
    let mut rows = String::new();
    for i in 0..n {
        let class = i % 2;
        let img = GrayImage::from_fn(SIDE, SIDE, |_, y| {
            let bright = if class == 0 { y < SIDE / 2 } else { y >= SIDE / 2 };
            Luma([if bright { 230 } else { 25 }])
        });
        let name = format!("img_{i:02}.png");
        img.save(dir.join(&name)).unwrap();
        rows.push_str(&format!("{name},{class}\n"));
    }
    std::fs::write(dir.join("labels.csv"), rows).unwrap();
}

fn write_spec(root: &Path, epochs: usize, start_epoch: usize, stop_epoch: usize) -> String {
    let spec = format!(
        "\
data:
  images_dir: {root}/images
  labels_csv: {root}/images/labels.csv
  image_height: {side}
  image_width: {side}
  num_classes: 2
training:
  epochs: {epochs}
  batch_size: 4
  learning_rate: 0.5
  penalty_lambda: 10.0
sampling:
  entropy_threshold: 0.5
  nr_queries: 2
  start_epoch: {start_epoch}
  stop_epoch: {stop_epoch}
  rect_size: 4
  rect_stride: 4
  nr_rects: 3
output:
  history_dir: {root}/history
  weights_dir: {root}/weights
  epochs_dir: {root}/epochs
  model_name: toy
",
        root = root.display(),
        side = SIDE,
    );
    let path = root.join("spec.yaml");
    std::fs::write(&path, spec).unwrap();
    path.display().to_string()
}

#[test]
fn pause_annotate_resume_cycle() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("images")).unwrap();
    write_images(&dir.path().join("images"), 16);

    // Active window is epoch 0 only, so the resumed run can finish.
    let spec = write_spec(dir.path(), 3, 0, 1);

    // First run: the zero-initialized model predicts uniformly on the
    // early batches, entropy exceeds the threshold, and the loop pauses
    // at epoch 0.
    run(&["anotar", "hitl", "train", &spec, "--quiet"]);

    let epoch_dir = dir.path().join("epochs/0");
    assert!(epoch_dir.join("query_0_rects.csv").exists());
    assert!(epoch_dir.join("mask.safetensors").exists());
    assert!(epoch_dir.join("model.safetensors").exists());

    let state = load_epoch_state(&epoch_dir).unwrap();
    assert!(!state.image_indexes.is_empty());
    assert!(state.epoch_train_loss.is_finite());

    // No feedback yet: the saved mask is empty.
    assert_eq!(load_mask(&epoch_dir.join("mask.safetensors")).unwrap().total(), 0.0);

    // The annotator keeps the top-ranked rectangle of the first query.
    let candidates = read_rects_csv(&epoch_dir.join("query_0_rects.csv")).unwrap();
    write_rects_csv(&epoch_dir.join("query_0_rects_selected.csv"), &candidates[..1]).unwrap();

    // Resume: selections are folded in and training runs to the end.
    run(&["anotar", "hitl", "train", &spec, "--resume-epoch", "0", "--quiet"]);

    // Best-validation weights were checkpointed under the flavored name.
    assert!(dir
        .path()
        .join("weights")
        .join("toy_100p_3e_high_entropy.safetensors")
        .exists());

    // History arrays cover every epoch.
    let losses: Vec<f32> = serde_json::from_str(
        &std::fs::read_to_string(
            dir.path().join("history").join("toy_val_losses_100_high_entropy.json"),
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(losses.len(), 3);
    assert!(losses.iter().all(|l| l.is_finite()));
}

#[test]
fn dry_run_validates_without_output() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("images")).unwrap();
    write_images(&dir.path().join("images"), 8);
    let spec = write_spec(dir.path(), 3, 3, 20);

    run(&["anotar", "hitl", "train", &spec, "--dry-run", "--quiet"]);

    assert!(!dir.path().join("epochs").exists());
    assert!(!dir.path().join("weights").exists());
}
