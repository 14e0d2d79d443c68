//! End-to-end runs of the papershelf binary against a temporary library

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Shelf {
    root: TempDir,
    home: TempDir,
}

impl Shelf {
    fn new() -> Self {
        let shelf = Self {
            root: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        };
        fs::write(
            shelf.root.path().join("conference.dat"),
            "nips\tneurips\nneurips\tneurips\ncvpr\tcvpr\n",
        )
        .unwrap();
        shelf
    }

    fn touch(&self, name: &str) {
        fs::write(self.root.path().join(name), b"%PDF-1.4").unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("papershelf").unwrap();
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .env_remove("RUST_LOG")
            .arg("--root")
            .arg(self.root.path());
        cmd
    }

    fn add_attention(&self) {
        self.touch("attention.pdf");
        self.cmd()
            .args([
                "add",
                "--path",
                "attention.pdf",
                "--title",
                "Attention Is All You Need",
                "--authors",
                "Vaswani, Ashish and Shazeer, Noam",
                "--venue",
                "NIPS",
                "--year",
                "2017",
                "--tags",
                "nlp; transformers",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("added paper 0"));
    }
}

#[test]
fn test_add_then_list_and_show() {
    let shelf = Shelf::new();
    shelf.add_attention();

    shelf
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "attention is all you need, vaswani, ashish; shazeer, noam, 2017",
        ));

    shelf
        .cmd()
        .args(["show", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("venue:     neurips"))
        .stdout(predicate::str::contains("tags:      nlp; transformers"));

    shelf
        .cmd()
        .args(["show", "0", "--bibtex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@inproceedings{vaswani2017attention,"));

    assert!(shelf.root.path().join("library.json").is_file());
}

#[test]
fn test_duplicate_add_fails() {
    let shelf = Shelf::new();
    shelf.add_attention();

    shelf
        .cmd()
        .args([
            "add",
            "--path",
            "attention.pdf",
            "--title",
            "Something Else",
            "--authors",
            "Doe, Jane",
            "--year",
            "2020",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate of paper 0"));
}

#[test]
fn test_incomplete_add_fails() {
    let shelf = Shelf::new();
    shelf
        .cmd()
        .args(["add", "--path", "missing.pdf", "--title", "Ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no existing document path"));
}

#[test]
fn test_find_edit_and_filters() {
    let shelf = Shelf::new();
    shelf.add_attention();

    shelf
        .cmd()
        .args(["find", "--venue", "neurips", "--year", "2016", "--window", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("attention is all you need"));

    shelf
        .cmd()
        .args(["find", "--title", "attention", "--exact"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    shelf.cmd().arg("unread").assert().success().stdout(predicate::str::contains("   0 ["));

    shelf
        .cmd()
        .args(["edit", "0", "--read", "true", "--rating", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revised paper 0"));

    shelf.cmd().arg("unread").assert().success().stdout(predicate::str::is_empty());
    shelf
        .cmd()
        .args(["show", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rating:    5"));
}

#[test]
fn test_import_rescan_and_remove() {
    let shelf = Shelf::new();
    shelf.touch("graph attention networks.pdf");

    shelf
        .cmd()
        .args(["import", "graph attention networks.pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 1 of 1 files"));

    shelf
        .cmd()
        .arg("revise")
        .assert()
        .success()
        .stdout(predicate::str::contains("graph attention networks"));

    shelf.touch("new.pdf");
    shelf
        .cmd()
        .args(["rescan", "--import"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new file: new.pdf"))
        .stdout(predicate::str::contains("imported 1 new files"));

    shelf
        .cmd()
        .args(["remove", "0", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed paper 1"));

    shelf
        .cmd()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("index is consistent (0 papers)"));

    assert!(shelf.root.path().join("new.pdf").is_file());
}

#[test]
fn test_venues_and_parse_bib() {
    let shelf = Shelf::new();
    let bib = shelf.root.path().join("entry.bib");
    fs::write(
        &bib,
        "@inproceedings{he2016deep,\n  title = {Deep Residual Learning for Image Recognition},\n  author = {He, Kaiming and Zhang, Xiangyu},\n  booktitle = {CVPR},\n  year = {2016}\n}\n",
    )
    .unwrap();

    shelf
        .cmd()
        .arg("venues")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 others"))
        .stdout(predicate::str::contains("neurips (0 papers): nips"));

    shelf
        .cmd()
        .arg("parse-bib")
        .arg(&bib)
        .assert()
        .success()
        .stdout(predicate::str::contains("authors: he, kaiming; zhang, xiangyu"))
        .stdout(predicate::str::contains("venue:   cvpr"))
        .stdout(predicate::str::contains("key:     he2016deep"));
}

#[test]
fn test_unknown_paper_is_reported() {
    let shelf = Shelf::new();
    shelf
        .cmd()
        .args(["show", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No paper with id 7"));
}

#[test]
fn test_find_partial_venue_keeps_venue_filter() {
    let shelf = Shelf::new();
    shelf.add_attention();
    shelf.touch("resnet.pdf");
    shelf
        .cmd()
        .args([
            "add", "--path", "resnet.pdf", "--title", "Deep Residual Learning", "--authors",
            "He, Kaiming", "--venue", "CVPR", "--year", "2017",
        ])
        .assert()
        .success();

    shelf
        .cmd()
        .args(["find", "--venue", "neur", "--year", "2017"])
        .assert()
        .success()
        .stdout(predicate::str::contains("attention is all you need"))
        .stdout(predicate::str::contains("deep residual learning").not());
}

#[test]
fn test_init_writes_config_once() {
    let shelf = Shelf::new();
    let config = shelf.root.path().join("papershelf.toml");

    shelf
        .cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));
    let text = fs::read_to_string(&config).unwrap();
    assert!(text.contains("snapshot_file = \"library.json\""));

    shelf
        .cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("config already at"));
}
