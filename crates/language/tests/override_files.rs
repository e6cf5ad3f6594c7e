use modhelper_language::{LanguageOverrides, ORIGINALS_DIR, OVERRIDES_DIR};
use modhelper_testkit::{init_test_tracing, Scratch};
use std::path::Path;

fn store() -> LanguageOverrides {
    let mut store = LanguageOverrides::new();
    store
        .add_custom_line("SeamothUpgrades", "SeamothDrill", "Seamoth drill arm")
        .unwrap();
    store
        .add_custom_line(
            "SeamothUpgrades",
            "Tooltip_SeamothDrill",
            "Mines resources.\nPower: {0}%",
        )
        .unwrap();
    store
        .add_custom_line("CyclopsExtras", "CyclopsSpeed", "Speed module")
        .unwrap();
    store
}

#[test]
fn originals_are_mirrored_once() {
    init_test_tracing();
    let scratch = Scratch::new().unwrap();
    let store = store();

    assert_eq!(store.write_originals(scratch.path()).unwrap(), 2);
    assert_eq!(
        scratch
            .read(Path::new(ORIGINALS_DIR).join("SeamothUpgrades.txt"))
            .unwrap(),
        "SeamothDrill:{Seamoth drill arm}\nTooltip_SeamothDrill:{Mines resources.\nPower: {0}%}\n"
    );

    // Unchanged lines do not rewrite the files.
    assert_eq!(store.write_originals(scratch.path()).unwrap(), 0);

    // A hand-edited originals file is restored.
    scratch
        .write_lines(
            Path::new(ORIGINALS_DIR).join("CyclopsExtras.txt"),
            &["CyclopsSpeed:{tampered}"],
        )
        .unwrap();
    assert_eq!(store.write_originals(scratch.path()).unwrap(), 1);
}

#[test]
fn overrides_apply_to_their_own_mod_only() {
    init_test_tracing();
    let scratch = Scratch::new().unwrap();
    let mut store = store();

    scratch
        .write_lines(
            Path::new(OVERRIDES_DIR).join("SeamothUpgrades.txt"),
            &[
                "SeamothDrill:{Drill arm MK2}",
                "Tooltip_SeamothDrill:{Digs.",
                "Energy: {0}%}",
                "CyclopsSpeed:{not mine}",
            ],
        )
        .unwrap();
    scratch
        .write_lines(
            Path::new(OVERRIDES_DIR).join("UnknownMod.txt"),
            &["SeamothDrill:{ignored}"],
        )
        .unwrap();
    scratch
        .write_lines(Path::new(OVERRIDES_DIR).join("notes.md"), &["SeamothDrill:{ignored}"])
        .unwrap();

    store.apply_files(scratch.path()).unwrap();

    assert_eq!(store.custom_line("SeamothDrill"), Some("Drill arm MK2"));
    assert_eq!(
        store.custom_line("Tooltip_SeamothDrill"),
        Some("Digs.\nEnergy: {0}%")
    );
    assert_eq!(store.custom_line("CyclopsSpeed"), Some("Speed module"));

    // Originals keep the mod's own text.
    let originals = scratch
        .read(Path::new(ORIGINALS_DIR).join("SeamothUpgrades.txt"))
        .unwrap();
    assert!(originals.contains("SeamothDrill:{Seamoth drill arm}"));
}

#[test]
fn apply_files_creates_layout() {
    let scratch = Scratch::new().unwrap();
    let language_dir = scratch.join("Language");
    let mut store = LanguageOverrides::new();

    store.apply_files(&language_dir).unwrap();
    assert!(language_dir.join(ORIGINALS_DIR).is_dir());
    assert!(language_dir.join(OVERRIDES_DIR).is_dir());
    assert_eq!(store.read_overrides(&language_dir).unwrap(), 0);
}
