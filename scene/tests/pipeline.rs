use {
    linkmesh::{
        accumulate, load_chain_spec, ApplyMode, Axis, ChainSpecError, Dirs, Layout, Op,
        Pipeline, Step,
    },
    linkmesh_scene::{Scene, SceneSnapshot, TriMesh, Triangle},
    nalgebra as na,
    pretty_assertions::assert_eq,
    std::{fs, path::Path},
};

const LINK_INFO: &str = "\
[model]
chain = base, link1

[ops]
base = tz0.5
link1 = rx45.0
";

fn part() -> TriMesh {
    TriMesh::new(vec![
        Triangle::new([
            na::Point3::new(0.0, 0.0, 0.0),
            na::Point3::new(1.0, 0.0, 0.0),
            na::Point3::new(0.0, 1.0, 0.0),
        ]),
        Triangle::new([
            na::Point3::new(0.0, 0.0, 0.0),
            na::Point3::new(0.0, 1.0, 0.0),
            na::Point3::new(0.0, 0.0, 1.0),
        ]),
    ])
}

fn setup(base: &Path, links: &[&str], info: &str) -> Dirs {
    let dirs = Dirs::resolve(base, &Layout::default());
    fs::create_dir_all(&dirs.src_stl).unwrap();
    for link in links {
        let file = fs::File::create(dirs.source_mesh(link)).unwrap();
        part().write_stl(file).unwrap();
    }
    fs::write(base.join("link_info.ini"), info).unwrap();
    dirs.create_outputs().unwrap();
    dirs
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn read_stl(path: &Path) -> TriMesh {
    TriMesh::read_stl(fs::File::open(path).unwrap()).unwrap()
}

fn assert_close(actual: &TriMesh, expected: &TriMesh) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.triangles.iter().zip(&expected.triangles) {
        for (p, q) in a.vertices.iter().zip(&e.vertices) {
            assert!((p - q).norm() < 1e-5, "{:?} != {:?}", p, q);
        }
    }
}

#[test]
fn two_link_chain() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = setup(dir.path(), &["base", "link1"], LINK_INFO);

    let spec = load_chain_spec(&dir.path().join("link_info.ini")).unwrap();
    assert!(spec.warnings.is_empty());

    let mut scene = Scene::new();
    let summary = Pipeline::new(&mut scene, &dirs, ApplyMode::Replay).run(&spec.parsed);
    assert!(summary.is_success());
    assert!(scene.is_empty());

    assert_eq!(files_in(&dirs.dst_blend), ["base.ron", "link1.ron"]);
    assert_eq!(files_in(&dirs.dst_dae), ["base.dae", "link1.dae"]);
    assert_eq!(files_in(&dirs.dst_stl), ["base.stl", "link1.stl"]);

    let link1 = &summary.processed[1];
    assert_eq!(link1.link, "link1");
    assert_eq!(
        link1.applied,
        [Op::translate(Axis::Z, 0.5), Op::rotate(Axis::X, 45.0)]
    );

    let base_iso = na::Isometry3::translation(0.0, 0.0, 0.5);
    assert_close(&read_stl(&dirs.dst_stl.join("base.stl")), &part().transformed(&base_iso));

    let link1_iso = na::Isometry3::rotation(na::Vector3::x() * 45f32.to_radians()) * base_iso;
    assert_close(&read_stl(&dirs.dst_stl.join("link1.stl")), &part().transformed(&link1_iso));

    let snapshot = SceneSnapshot::load(&dirs.working_state("link1")).unwrap();
    assert_eq!(snapshot.objects.len(), 1);
    assert_eq!(snapshot.objects[0].name, "Link1");
    assert_eq!(snapshot.objects[0].pose.location, na::Vector3::zeros());

    let collada = fs::read_to_string(dirs.dst_dae.join("link1.dae")).unwrap();
    assert!(collada.contains("<geometry id=\"Link1-mesh\" name=\"Link1\">"));
}

#[test]
fn composed_matches_replay() {
    let replay_dir = tempfile::tempdir().unwrap();
    let composed_dir = tempfile::tempdir().unwrap();
    let replay = setup(replay_dir.path(), &["base", "link1"], LINK_INFO);
    let composed = setup(composed_dir.path(), &["base", "link1"], LINK_INFO);

    let spec = load_chain_spec(&replay_dir.path().join("link_info.ini")).unwrap();
    Pipeline::new(&mut Scene::new(), &replay, ApplyMode::Replay).run(&spec.parsed);
    Pipeline::new(&mut Scene::new(), &composed, ApplyMode::Composed).run(&spec.parsed);

    for link in &["base", "link1"] {
        let path = |dirs: &Dirs| dirs.dst_stl.join(format!("{}.stl", link));
        assert_close(&read_stl(&path(&composed)), &read_stl(&path(&replay)));
    }

    let links: Vec<_> = accumulate(&spec.parsed).map(|link| link.ops.len()).collect();
    assert_eq!(links, [1, 2]);
}

#[test]
fn missing_model_section_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = setup(dir.path(), &["base"], "[ops]\nbase = tz0.5\n");

    let result = load_chain_spec(&dir.path().join("link_info.ini"));
    assert!(matches!(result, Err(ChainSpecError::MissingModel)));

    assert!(files_in(&dirs.dst_blend).is_empty());
    assert!(files_in(&dirs.dst_dae).is_empty());
    assert!(files_in(&dirs.dst_stl).is_empty());
}

#[test]
fn missing_source_mesh_fails_only_its_link() {
    let dir = tempfile::tempdir().unwrap();
    let info = "[model]\nchain = base, link1, link2\n\n[ops]\nbase = tz0.5\nlink1 = rx45.0\nlink2 = ty1.0\n";
    let dirs = setup(dir.path(), &["base", "link2"], info);

    let spec = load_chain_spec(&dir.path().join("link_info.ini")).unwrap();
    let mut scene = Scene::new();
    let summary = Pipeline::new(&mut scene, &dirs, ApplyMode::Replay).run(&spec.parsed);

    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].link, "link1");
    assert_eq!(summary.failed[0].step, Step::Import);

    let processed: Vec<_> = summary.processed.iter().map(|out| out.link.as_str()).collect();
    assert_eq!(processed, ["base", "link2"]);
    assert_eq!(summary.processed[1].applied.len(), 3);
    assert_eq!(files_in(&dirs.dst_stl), ["base.stl", "link2.stl"]);
}

#[test]
fn origin_moves_to_reference_point() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = setup(dir.path(), &["base", "link1"], LINK_INFO);
    let spec = load_chain_spec(&dir.path().join("link_info.ini")).unwrap();

    let reference = na::Point3::new(0.25, -0.5, 1.0);
    let mut scene = Scene::with_reference_point(reference);
    let summary = Pipeline::new(&mut scene, &dirs, ApplyMode::Replay).run(&spec.parsed);
    assert!(summary.is_success());

    let snapshot = SceneSnapshot::load(&dirs.working_state("base")).unwrap();
    assert_eq!(snapshot.objects[0].pose.location, reference.coords);

    let base_iso = na::Isometry3::translation(0.0, 0.0, 0.5);
    assert_close(&read_stl(&dirs.dst_stl.join("base.stl")), &part().transformed(&base_iso));
}
