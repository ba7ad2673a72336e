// tests/walker.rs

//! Traversal-engine properties: idempotent visitation, cycle termination,
//! silent not-found handling, recommends gating, and the per-ecosystem
//! record enrichment seen through the public API.

mod common;

use common::{MockGateway, dpkg_stanza};
use std::collections::HashMap;
use tally::ecosystem::{DpkgEcosystem, FreeBsdEcosystem, RpmEcosystem};
use tally::model::{PackageKind, RelationshipKind};
use tally::{DependencyWalker, LicenseRegistry, NOASSERTION};
use tempfile::TempDir;

fn dpkg_walker<'a>(
    ecosystem: &'a DpkgEcosystem,
    gateway: &'a MockGateway,
    licenses: &'a LicenseRegistry,
) -> DependencyWalker<'a> {
    DependencyWalker::new(ecosystem, gateway, licenses, "Ubuntu", "22.04")
}

fn dpkg_ecosystem(root: &TempDir) -> DpkgEcosystem {
    DpkgEcosystem::new(root.path(), &HashMap::new())
}

fn edges(walker: &DependencyWalker<'_>) -> Vec<(String, RelationshipKind, String)> {
    walker
        .relationships()
        .all()
        .iter()
        .map(|edge| (edge.source.clone(), edge.kind, edge.target.clone()))
        .collect()
}

#[test]
fn test_package_scenario_with_shared_dependency() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new()
        .respond("dpkg -s app", &dpkg_stanza("app", "1.0-1", "libfoo (>= 1.2), libbar", ""))
        .respond("dpkg -s libfoo", &dpkg_stanza("libfoo", "1.2-3", "libbar", ""))
        .respond("dpkg -s libbar", &dpkg_stanza("libbar", "0.9-1", "", ""));

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_package("app");

    assert_eq!(walker.registry().len(), 3);
    assert_eq!(walker.parent(), "Ubuntu-22.04-Package-app");

    let all_edges = edges(&walker);
    assert_eq!(
        all_edges,
        vec![
            (
                "Ubuntu-22.04-Package-app".to_string(),
                RelationshipKind::Describes,
                "app".to_string()
            ),
            ("app".to_string(), RelationshipKind::DependsOn, "libfoo".to_string()),
            ("libfoo".to_string(), RelationshipKind::DependsOn, "libbar".to_string()),
            ("app".to_string(), RelationshipKind::DependsOn, "libbar".to_string()),
        ]
    );

    // The shared dependency is extracted exactly once
    assert_eq!(gateway.call_count("dpkg -s libbar"), 1);
}

#[test]
fn test_cycle_terminates_with_both_edges() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new()
        .respond("dpkg -s liba", &dpkg_stanza("liba", "1.0", "libb", ""))
        .respond("dpkg -s libb", &dpkg_stanza("libb", "2.0", "liba", ""));

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_package("liba");

    assert_eq!(walker.registry().len(), 2);
    let all_edges = edges(&walker);
    assert!(all_edges.contains(&(
        "liba".to_string(),
        RelationshipKind::DependsOn,
        "libb".to_string()
    )));
    assert!(all_edges.contains(&(
        "libb".to_string(),
        RelationshipKind::DependsOn,
        "liba".to_string()
    )));
    assert_eq!(gateway.call_count("dpkg -s liba"), 1);
    assert_eq!(gateway.call_count("dpkg -s libb"), 1);
}

#[test]
fn test_self_dependency_terminates() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new()
        .respond("dpkg -s selfish", &dpkg_stanza("selfish", "1.0", "selfish", ""));

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_package("selfish");

    assert_eq!(walker.registry().len(), 1);
    assert_eq!(gateway.call_count("dpkg -s selfish"), 1);
}

#[test]
fn test_unknown_package_yields_nothing_and_spares_siblings() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new()
        .respond("dpkg -s app", &dpkg_stanza("app", "1.0", "ghost, libbar", ""))
        .respond("dpkg -s libbar", &dpkg_stanza("libbar", "0.9", "", ""));

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_package("app");

    // No record and no edge for the unknown name
    assert_eq!(walker.registry().len(), 2);
    assert!(walker.registry().get("libbar", "0.9").is_some());
    let all_edges = edges(&walker);
    assert!(all_edges.iter().all(|(_, _, target)| target != "ghost"));
    // The sibling queued after the unknown name still resolved
    assert!(all_edges.contains(&(
        "app".to_string(),
        RelationshipKind::DependsOn,
        "libbar".to_string()
    )));
}

#[test]
fn test_unknown_root_package_resolves_to_empty_run() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new();

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_package("nonesuch");

    assert!(walker.registry().is_empty());
    assert!(walker.relationships().is_empty());
}

#[test]
fn test_recommends_edge_gated_on_visited() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new()
        .respond(
            "dpkg -s app",
            &dpkg_stanza("app", "1.0", "libfoo", "rec-used, rec-missing"),
        )
        .respond("dpkg -s libfoo", &dpkg_stanza("libfoo", "1.0", "rec-used", ""))
        .respond("dpkg -s rec-used", &dpkg_stanza("rec-used", "3.0", "", ""));

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_package("app");

    let all_edges = edges(&walker);
    let app_to_rec = all_edges
        .iter()
        .filter(|(source, _, target)| source == "app" && target == "rec-used")
        .count();
    // One deferred edge for the resolved recommendation, none for the other
    assert_eq!(app_to_rec, 1);
    assert!(all_edges.iter().all(|(_, _, target)| target != "rec-missing"));
    // Recommendations are never queried themselves
    assert_eq!(gateway.call_count("dpkg -s rec-missing"), 0);
}

#[test]
fn test_system_mode_hangs_everything_off_the_distro_root() {
    let root = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new()
        .respond("dpkg-query -W -f ${Package}\\n", "app\nlibfoo\n")
        .respond("dpkg -s app", &dpkg_stanza("app", "1.0", "libfoo", ""))
        .respond("dpkg -s libfoo", &dpkg_stanza("libfoo", "1.2", "", ""));

    let licenses = LicenseRegistry::new();
    let ecosystem = dpkg_ecosystem(&root);
    let mut walker = dpkg_walker(&ecosystem, &gateway, &licenses);
    walker.resolve_system().unwrap();

    let records = walker.registry().all();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].name, "ubuntu");
    assert_eq!(records[0].version, "22.04");
    assert_eq!(records[0].kind, PackageKind::OperatingSystem);
    assert!(records[1..].iter().all(|r| r.kind == PackageKind::Application));

    let all_edges = edges(&walker);
    assert_eq!(
        all_edges,
        vec![
            ("Distro-Ubuntu".to_string(), RelationshipKind::Describes, "ubuntu".to_string()),
            ("ubuntu".to_string(), RelationshipKind::DependsOn, "app".to_string()),
            ("app".to_string(), RelationshipKind::DependsOn, "libfoo".to_string()),
            ("ubuntu".to_string(), RelationshipKind::DependsOn, "libfoo".to_string()),
        ]
    );
    // Each name extracted once even though libfoo appears twice
    assert_eq!(gateway.call_count("dpkg -s libfoo"), 1);
}

#[test]
fn test_rpm_records_carry_license_and_locator() {
    let gateway = MockGateway::new()
        .respond(
            "rpm -qi widget",
            "Name        : widget\n\
             Version     : 1.0\n\
             Release     : 2.fc39\n\
             Architecture: x86_64\n\
             License     : MIT\n\
             Summary     : a widget\n\
             URL         : https://example.org\n\
             Vendor      : Fedora Project\n",
        )
        .respond(
            "yum repoquery --deplist widget",
            "  dependency: libgadget.so.1()(64bit)\n   provider: gadget-0.5-1.fc39.x86_64\n",
        )
        .respond(
            "rpm -qi gadget",
            "Name        : gadget\nVersion     : 0.5\nLicense     : Widget Public License\n",
        )
        .respond("yum repoquery --deplist gadget", "");

    let mut os_release = HashMap::new();
    os_release.insert("id".to_string(), "fedora".to_string());
    os_release.insert("version_id".to_string(), "39".to_string());
    let ecosystem = RpmEcosystem::new(&os_release);
    let licenses = LicenseRegistry::new();
    let mut walker = DependencyWalker::new(&ecosystem, &gateway, &licenses, "Fedora", "39");
    walker.resolve_package("widget");

    assert_eq!(walker.registry().len(), 2);

    let widget = walker.registry().get("widget", "1.0").unwrap();
    assert_eq!(widget.license_declared, "MIT");
    assert_eq!(widget.license_concluded, "MIT");
    assert_eq!(
        widget.locator.as_deref(),
        Some("pkg:rpm/fedora/widget@1.0?arch=x86_64&distro=fedora-39")
    );
    assert_eq!(widget.summary.as_deref(), Some("a widget"));

    let gadget = walker.registry().get("gadget", "0.5").unwrap();
    assert_eq!(gadget.license_declared, NOASSERTION);
    assert_eq!(gadget.license_concluded, NOASSERTION);
    assert!(gadget.license_comment.as_deref().unwrap().contains("not a valid"));

    let all_edges = edges(&walker);
    assert!(all_edges.contains(&(
        "widget".to_string(),
        RelationshipKind::DependsOn,
        "gadget".to_string()
    )));
}

#[test]
fn test_freebsd_walk_with_license_directory() {
    let root = tempfile::tempdir().unwrap();
    let licenses_dir = root.path().join("usr/local/share/licenses/bash-5.2.15");
    std::fs::create_dir_all(&licenses_dir).unwrap();
    std::fs::write(licenses_dir.join("GPLv3+"), "").unwrap();

    let prefix = format!("pkg --rootdir {}", root.path().display());
    let gateway = MockGateway::new()
        .respond(
            &format!("{} info bash-5.2.15", prefix),
            "Name           : bash\n\
             Version        : 5.2.15\n\
             Architecture   : FreeBSD:13:amd64\n\
             Maintainer     : shells@example.org\n\
             Comment        : The GNU Bourne\n\
                 Again shell\n\
             WWW            : https://www.gnu.org/software/bash/\n",
        )
        .respond(
            &format!("{} info -d bash-5.2.15", prefix),
            "bash-5.2.15:\n\treadline-8.2.1\n",
        )
        .respond(
            &format!("{} info readline-8.2.1", prefix),
            "Name           : readline\nVersion        : 8.2.1\n",
        )
        .respond(&format!("{} info -d readline-8.2.1", prefix), "readline-8.2.1:\n");

    let ecosystem = FreeBsdEcosystem::new(root.path(), &HashMap::new());
    let licenses = LicenseRegistry::new();
    let mut walker = DependencyWalker::new(&ecosystem, &gateway, &licenses, "FreeBSD", "13.2");
    walker.resolve_package("bash-5.2.15");

    let bash = walker.registry().get("bash", "5.2.15").unwrap();
    assert_eq!(bash.license_declared, "GPL-3.0-or-later");
    assert_eq!(bash.license_concluded, "GPL-3.0-or-later");
    assert_eq!(bash.summary.as_deref(), Some("The GNU Bourne Again shell"));
    assert_eq!(
        bash.locator.as_deref(),
        Some("pkg:generic/bash@5.2.15?distro=freebsd&arch=x86_64")
    );
    assert_eq!(
        bash.platform_id.as_deref(),
        Some("cpe:2.3:a:freebsd:bash:5.2.15:*:*:*:*:*:*:*")
    );

    assert!(walker.registry().get("readline", "8.2.1").is_some());
    let all_edges = edges(&walker);
    assert!(all_edges.contains(&(
        "bash-5.2.15".to_string(),
        RelationshipKind::DependsOn,
        "readline".to_string()
    )));
}
