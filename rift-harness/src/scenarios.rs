//! End-to-end flows against the in-memory host.
use std::cell::RefCell;
use std::collections::BTreeSet;

use rift_core::command::CommandDispatcher;
use rift_core::command::context::CommandContext;
use rift_core::command::error::CommandError;
use rift_core::command::sender::CommandSender;
use rift_core::config::{DimletRules, PowerConfig};
use rift_core::dimension::persist::DIMENSIONS_RECORD;
use rift_core::dimension::{
    DimensionDescriptor, DimensionManager, DimensionTicker, FreezableWorld, PhasedFieldPolicy,
    PowerLedger, SustainPolicy, freeze, unfreeze,
};
use rift_core::host::{DimensionRegistry, HostError, ProviderKind};
use rift_core::network::{CRegisterDimension, ClientboundPacket};
use rift_core::storage::SaveStore;
use rift_utils::{ChunkPos, DimensionId, Vector3};
use rustc_hash::FxHashSet;
use simdnbt::owned::{NbtCompound, NbtList, NbtTag};
use uuid::Uuid;

use crate::{TestRegistry, TestServer, TestWorld, TestWorldContext, init};

const U1: Uuid = Uuid::from_u128(0x1111);
const U2: Uuid = Uuid::from_u128(0x2222);

fn descriptor(recipe: &str, cost: i32) -> DimensionDescriptor {
    DimensionDescriptor::new(recipe, cost)
}

fn create(
    server: &mut TestServer,
    manager: &mut DimensionManager,
    recipe: &str,
    name: &str,
    owner: Option<Uuid>,
) -> DimensionId {
    let owner_name = if owner.is_some() { "Steve" } else { "" };
    manager
        .create(
            &mut server.host(),
            &TestWorldContext::default(),
            descriptor(recipe, 5),
            name,
            owner_name,
            owner,
        )
        .expect("ids are available")
}

#[test]
fn test_create_assigns_distinct_ids_and_counts_owners() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();

    let n = create(&mut server, &mut manager, "biome=plains,terrain=flat", "Alpha", Some(U1));
    assert_ne!(n, DimensionId::OVERWORLD);
    assert_eq!(manager.count_owned_dimensions(U1), 1);

    let m = create(&mut server, &mut manager, "biome=desert,terrain=flat", "Beta", Some(U2));
    assert_ne!(m, DimensionId::OVERWORLD);
    assert_ne!(m, n);
    assert_eq!(manager.count_owned_dimensions(U1), 1);
    assert_eq!(manager.count_owned_dimensions(U2), 1);

    assert!(server.registry.is_registered(n));
    assert!(server.registry.is_registered(m));
    assert_eq!(server.registry.provider(n), Some(ProviderKind::Generic));
    assert_eq!(server.worlds.touched(), &[n, m]);
    assert!(server.store.is_dirty(DIMENSIONS_RECORD));
    assert_eq!(manager.information(n).map(|info| info.name()), Some("Alpha"));
    assert!(manager.is_consistent());
}

#[test]
fn test_create_broadcasts_registration_then_snapshot() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let id = create(&mut server, &mut manager, "biome=plains", "Alpha", None);

    let broadcasts = server.network.broadcasts();
    assert_eq!(broadcasts.len(), 2);
    assert_eq!(
        broadcasts[0],
        ClientboundPacket::RegisterDimension(CRegisterDimension { id })
    );
    let ClientboundPacket::SyncDimensionInfo(snapshot) = &broadcasts[1] else {
        panic!("expected a snapshot, got {:?}", broadcasts[1]);
    };
    assert_eq!(snapshot.descriptors.len(), 1);
    assert_eq!(snapshot.information.len(), 1);
    assert_eq!(snapshot.descriptors[0].0, id);
}

#[test]
fn test_live_descriptor_is_not_created_twice() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let first = create(&mut server, &mut manager, "biome=plains", "Alpha", Some(U1));

    let second = manager.create(
        &mut server.host(),
        &TestWorldContext::default(),
        descriptor("biome=plains", 5),
        "Again",
        "Alex",
        Some(U2),
    );
    assert_eq!(second, None);
    assert_eq!(manager.dimensions().count(), 1);
    assert_eq!(manager.count_owned_dimensions(U1), 1);
    assert_eq!(manager.count_owned_dimensions(U2), 0);
    assert_eq!(server.registry.next_free_calls(), 1);
    assert_eq!(manager.information(first).map(|info| info.name()), Some("Alpha"));
}

#[test]
fn test_recover_refuses_a_descriptor_live_elsewhere() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let live = create(&mut server, &mut manager, "biome=plains", "Alpha", None);

    assert!(!manager.recover(
        &mut server.host(),
        &TestWorldContext::default(),
        DimensionId(40),
        descriptor("biome=plains", 5),
        "Copy",
        "",
        None,
    ));
    assert_eq!(manager.dimension_id(&descriptor("biome=plains", 5)), Some(live));
    assert!(manager.information(live).is_some());
    assert!(!server.registry.is_registered(DimensionId(40)));

    assert!(!manager.recover(
        &mut server.host(),
        &TestWorldContext::default(),
        live,
        descriptor("biome=desert", 5),
        "Replacement",
        "",
        None,
    ));
    assert_eq!(manager.information(live).map(|info| info.name()), Some("Alpha"));

    manager.close(&mut server.host());
    assert!(!server.registry.is_registered(live));
}

#[test]
fn test_removed_and_reclaimed_id_is_reused() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let n = create(&mut server, &mut manager, "biome=plains", "Alpha", Some(U1));

    assert!(manager.remove(&mut server.host(), n));
    assert!(!server.registry.is_registered(n));
    assert_eq!(server.registry.provider(n), None);
    assert!(manager.reclaimed_ids().is_empty());
    assert_eq!(manager.count_owned_dimensions(U1), 0);

    assert!(manager.reclaim_id(n));
    let again = create(&mut server, &mut manager, "biome=desert", "Beta", Some(U2));
    assert_eq!(again, n);
    assert_eq!(server.registry.next_free_calls(), 1);
    assert!(manager.reclaimed_ids().is_empty());
}

#[test]
fn test_reclaimed_id_claimed_elsewhere_is_skipped() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let n = create(&mut server, &mut manager, "biome=plains", "Alpha", None);
    manager.remove(&mut server.host(), n);
    manager.reclaim_id(n);

    server.registry.claim(n);
    let fresh = create(&mut server, &mut manager, "biome=desert", "Beta", None);
    assert_ne!(fresh, n);
    assert_eq!(server.registry.next_free_calls(), 2);
    // Still reusable once the other claim goes away.
    assert!(manager.reclaimed_ids().contains(&n));
}

#[test]
fn test_unusable_host_offers_fall_back_to_a_scan() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let first = create(&mut server, &mut manager, "biome=plains", "A", None);
    assert_eq!(first, DimensionId(2));

    server.registry.push_offer(Ok(first));
    assert_eq!(
        create(&mut server, &mut manager, "biome=desert", "B", None),
        DimensionId(3)
    );

    server.registry.push_offer(Ok(DimensionId::OVERWORLD));
    assert_eq!(
        create(&mut server, &mut manager, "biome=forest", "C", None),
        DimensionId(4)
    );

    server
        .registry
        .push_offer(Err(HostError::Rejected("out of ids".to_string())));
    assert_eq!(
        create(&mut server, &mut manager, "biome=taiga", "D", None),
        DimensionId(5)
    );
}

#[test]
fn test_ids_are_never_double_allocated() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let mut live: Vec<DimensionId> = Vec::new();

    for step in 0..40 {
        if step % 3 == 2 {
            let victim = live.remove(step % live.len());
            manager.remove(&mut server.host(), victim);
            if step % 2 == 0 {
                manager.reclaim_id(victim);
            }
        } else {
            let before: BTreeSet<DimensionId> = manager.dimensions().map(|(id, _)| id).collect();
            let id = create(
                &mut server,
                &mut manager,
                &format!("biome=plains,step={step}"),
                "dim",
                None,
            );
            assert!(id.is_assignable());
            assert!(!before.contains(&id), "{id} handed out twice");
            live.push(id);
        }
        assert!(manager.is_consistent());
        for id in manager.reclaimed_ids() {
            assert!(manager.descriptor(*id).is_none());
        }
    }
}

#[test]
fn test_saved_table_reopens_equal() -> anyhow::Result<()> {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let a = create(&mut server, &mut manager, "biome=plains,terrain=flat", "Alpha", Some(U1));
    let b = create(&mut server, &mut manager, "terrain=cave", "Beta", None);
    let c = create(&mut server, &mut manager, "biome=mod:glow", "Gamma", Some(U2));

    assert!(manager.set_actual_cost(&mut server.host(), b, 42));
    assert!(manager.rename(&mut server.host(), b, "Renamed"));
    assert!(manager.set_owner(&mut server.host(), a, Some(U2), "Alex"));
    assert!(!manager.rename(&mut server.host(), DimensionId(99), "Nobody"));
    manager.remove(&mut server.host(), c);
    manager.reclaim_id(c);
    manager.reclaim_id(DimensionId(17));
    manager.save(&mut server.host());

    let reopened = server.open_manager()?;
    for id in [a, b] {
        assert_eq!(reopened.descriptor(id), manager.descriptor(id));
        assert_eq!(reopened.information(id), manager.information(id));
    }
    assert_eq!(reopened.descriptor(c), None);
    assert_eq!(reopened.reclaimed_ids(), manager.reclaimed_ids());
    assert_eq!(reopened.maintenance_cost(b), 42);
    assert!(reopened.is_consistent());

    let first = server.store.load(DIMENSIONS_RECORD);
    reopened.save(&mut server.host());
    assert_eq!(server.store.load(DIMENSIONS_RECORD), first);
    Ok(())
}

#[test]
fn test_corrupt_table_is_reported() {
    init();
    let mut server = TestServer::new();
    let mut record = NbtCompound::new();
    record.insert("id", 3);
    let mut nbt = NbtCompound::new();
    nbt.insert("dimensions", NbtList::Compound(vec![record]));
    server.store.store(DIMENSIONS_RECORD, nbt);

    let error = server.open_manager().expect_err("descriptor is missing");
    assert!(format!("{error:#}").contains("descriptor"));

    let mut nbt = NbtCompound::new();
    nbt.insert("reclaimedIds", NbtTag::String("nope".to_string().into()));
    server.store.store(DIMENSIONS_RECORD, nbt);
    assert!(server.open_manager().is_err());
}

#[test]
fn test_restart_registers_persisted_dimensions() -> anyhow::Result<()> {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let a = create(&mut server, &mut manager, "biome=plains", "Alpha", None);
    let b = create(&mut server, &mut manager, "biome=desert", "Beta", None);

    server.restart();
    assert!(!server.registry.is_registered(a));

    let manager = server.open_manager()?;
    manager.register_dimensions(&mut server.host());
    assert!(server.registry.is_registered(a));
    assert!(server.registry.is_registered(b));
    assert_eq!(
        server.network.broadcasts(),
        vec![
            ClientboundPacket::from(CRegisterDimension { id: a }),
            ClientboundPacket::from(CRegisterDimension { id: b }),
        ]
    );
    Ok(())
}

#[test]
fn test_recover_makes_an_id_live_again() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    manager.reclaim_id(DimensionId(9));

    let recovered = manager.recover(
        &mut server.host(),
        &TestWorldContext::default(),
        DimensionId(9),
        descriptor("biome=plains", 7),
        "Old",
        "Alex",
        Some(U2),
    );
    assert!(recovered);
    assert!(server.registry.is_registered(DimensionId(9)));
    assert!(manager.reclaimed_ids().is_empty());
    assert_eq!(manager.count_owned_dimensions(U2), 1);
    assert_eq!(manager.maintenance_cost(DimensionId(9)), 7);
    assert_eq!(
        manager.dimension_id(&descriptor("biome=plains", 7)),
        Some(DimensionId(9))
    );

    assert!(!manager.recover(
        &mut server.host(),
        &TestWorldContext::default(),
        DimensionId::OVERWORLD,
        descriptor("biome=desert", 1),
        "Nope",
        "",
        None,
    ));
}

#[test]
fn test_construction_failure_releases_the_id() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let broken = descriptor("terrain=flat", 5);

    let created = manager.create(
        &mut server.host(),
        &TestWorldContext::without_biomes(),
        broken.clone(),
        "Broken",
        "",
        Some(U1),
    );
    assert_eq!(created, None);

    let id = DimensionId(2);
    assert_eq!(manager.descriptor(id), None);
    assert_eq!(manager.information(id), None);
    assert_eq!(manager.count_owned_dimensions(U1), 0);
    assert!(!server.registry.is_registered(id));
    assert_eq!(server.registry.provider(id), None);
    assert!(manager.reclaimed_ids().contains(&id));
    assert!(server.store.is_dirty(DIMENSIONS_RECORD));
    assert!(server.worlds.touched().is_empty());
    assert!(manager.is_consistent());

    let again = create(&mut server, &mut manager, "terrain=flat", "Fixed", Some(U1));
    assert_eq!(again, id);
    assert!(server.registry.is_registered(id));
    assert!(manager.reclaimed_ids().is_empty());
}

#[test]
fn test_failed_build_leaves_nothing_for_close() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let recovered = manager.recover(
        &mut server.host(),
        &TestWorldContext::without_biomes(),
        DimensionId(6),
        descriptor("terrain=cave", 5),
        "Broken",
        "",
        None,
    );
    assert!(!recovered);
    assert!(!server.registry.is_registered(DimensionId(6)));
    assert!(manager.reclaimed_ids().contains(&DimensionId(6)));

    manager.close(&mut server.host());
    assert!(!server.registry.is_registered(DimensionId(6)));
    assert_eq!(server.registry.provider(DimensionId(6)), None);
}

#[test]
fn test_server_table_takes_a_single_synced_entry() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let ids: Vec<DimensionId> = ["biome=plains", "biome=desert", "biome=forest"]
        .into_iter()
        .map(|recipe| create(&mut server, &mut manager, recipe, "dim", Some(U1)))
        .collect();
    let before: Vec<_> = ids
        .iter()
        .map(|id| (manager.descriptor(*id).cloned(), manager.information(*id).cloned()))
        .collect();

    let mut source = DimensionManager::new();
    let seven = source
        .create(
            &mut TestServer::new().host(),
            &TestWorldContext::default(),
            descriptor("biome=taiga", 9),
            "Seven",
            "",
            None,
        )
        .expect("id");
    let snapshot = source.sync_packet();
    let incoming_descriptor = snapshot.descriptors[0].1.clone();
    let incoming_information = snapshot.information[0].1.clone();
    manager.sync_from_server(
        [(DimensionId(7), incoming_descriptor.clone())],
        [(DimensionId(7), incoming_information.clone())],
    );

    assert_eq!(seven, DimensionId(2));
    assert_eq!(manager.descriptor(DimensionId(7)), Some(&incoming_descriptor));
    assert_eq!(manager.information(DimensionId(7)), Some(&incoming_information));
    for (id, (descriptor, information)) in ids.iter().zip(before) {
        assert_eq!(manager.descriptor(*id).cloned(), descriptor);
        assert_eq!(manager.information(*id).cloned(), information);
    }
    assert_eq!(manager.dimensions().count(), 4);
    assert_eq!(manager.count_owned_dimensions(U1), 3);
    assert!(manager.is_consistent());
}

#[test]
fn test_host_failures_do_not_abort_create() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    server.registry.fail_register(DimensionId(2));
    server.worlds.fail_touch(DimensionId(2));

    let id = create(&mut server, &mut manager, "biome=plains", "Alpha", None);
    assert_eq!(id, DimensionId(2));
    assert!(manager.information(id).is_some());
    assert!(!server.registry.is_registered(id));
    assert!(server.worlds.touched().is_empty());
}

#[test]
fn test_unregister_survives_partial_failure() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let a = create(&mut server, &mut manager, "biome=plains", "A", None);
    let b = create(&mut server, &mut manager, "biome=desert", "B", None);
    let c = create(&mut server, &mut manager, "biome=forest", "C", None);
    server.registry.fail_unregister(b);

    assert_eq!(manager.unregister_dimensions(&mut server.host()), 2);
    assert!(!server.registry.is_registered(a));
    assert!(server.registry.is_registered(b));
    assert!(!server.registry.is_registered(c));

    // Already unregistered ids are skipped quietly.
    assert_eq!(manager.unregister_dimensions(&mut server.host()), 2);
}

#[test]
fn test_close_unregisters_everything() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let a = create(&mut server, &mut manager, "biome=plains", "A", None);
    manager.close(&mut server.host());
    assert!(!server.registry.is_registered(a));
}

#[test]
fn test_energy_survives_a_restart() -> anyhow::Result<()> {
    init();
    let mut server = TestServer::new();
    let mut ledger = server.open_ledger()?;
    ledger.set_energy_level(DimensionId(2), 4_000_000_000);
    ledger.drain(DimensionId(3), 25);
    ledger.save(&mut server.store);

    server.restart();
    let reopened = server.open_ledger()?;
    assert_eq!(reopened, ledger);
    assert_eq!(reopened.energy_level(DimensionId(3)), -25);
    assert_eq!(reopened.energy_level(DimensionId(4)), 0);
    Ok(())
}

#[test]
fn test_client_mirrors_the_server_from_packets() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let a = create(&mut server, &mut manager, "biome=plains", "Alpha", Some(U1));
    let b = create(&mut server, &mut manager, "terrain=flat", "Beta", None);

    let mut client = DimensionManager::new();
    let mut client_registry = TestRegistry::new();
    for packet in server.network.broadcasts() {
        client.handle_packet(packet, &mut client_registry);
    }

    for id in [a, b] {
        assert!(client_registry.is_registered(id));
        assert_eq!(client.descriptor(id), manager.descriptor(id));
        assert_eq!(client.information(id), manager.information(id));
    }
    assert_eq!(client.count_owned_dimensions(U1), 1);
    assert!(client.is_consistent());
}

#[test]
fn test_rules_go_to_one_session() {
    init();
    let mut server = TestServer::new();
    let manager = DimensionManager::new();
    let rules = DimletRules::default();
    manager.sync_rules(&server.host(), U1, &rules);

    assert!(server.network.broadcasts().is_empty());
    let sent = server.network.sent_to(U1);
    assert_eq!(sent.len(), 1);

    let mut client = DimensionManager::new();
    client.handle_packet(sent[0].clone(), &mut TestRegistry::new());
    assert_eq!(client.synced_rules(), Some(&rules));
}

fn at(x: f64, y: f64, z: f64) -> Vector3<f64> {
    Vector3::new(x, y, z)
}

/// A world with one sustaining player at (14.5, 64, 8.5) and entities around it.
struct FreezeFixture {
    world: TestWorld,
    players: FxHashSet<i32>,
    kept: FxHashSet<i32>,
}

fn freeze_fixture(charge: Option<i64>) -> FreezeFixture {
    let mut world = TestWorld::new(DimensionId(2));
    let anchor = world.add_player(U1, at(14.5, 64.0, 8.5), charge);
    let bystander = world.add_player(U2, at(100.5, 64.0, 100.5), None);

    let across_border = world.spawn_entity(at(16.5, 64.0, 8.5));
    let near = world.spawn_entity(at(14.5, 64.0, 12.5));
    let above = world.spawn_entity(at(14.5, 67.5, 8.5));
    world.spawn_entity(at(14.5, 64.0, 13.5));
    world.spawn_entity(at(40.5, 64.0, 8.5));
    world.spawn_entity(at(14.5, 80.5, 8.5));
    world.spawn_entity(at(101.5, 64.0, 100.5));
    world.place_tile(Vector3::new(14, 64, 8));
    world.place_tile(Vector3::new(40, 10, -3));

    let players: FxHashSet<i32> = [anchor, bystander].into_iter().collect();
    let mut kept = players.clone();
    kept.extend([across_border, near, above]);
    FreezeFixture {
        world,
        players,
        kept,
    }
}

#[test]
fn test_freeze_keeps_players_and_entities_near_anchors() {
    init();
    let mut fixture = freeze_fixture(Some(1000));
    let config = PowerConfig::default();
    let policy = PhasedFieldPolicy::new(&config);

    let outcome = freeze(
        &mut fixture.world,
        &DimensionManager::new(),
        &config,
        Some(&policy as &dyn SustainPolicy),
    );
    assert_eq!(outcome.anchors, vec![Vector3::new(14, 64, 8)]);
    assert_eq!(outcome.kept, fixture.kept);
    assert_eq!(fixture.world.active_entities(), fixture.kept);
    assert!(fixture.world.active_tiles().is_empty());
    assert_eq!(fixture.world.sustain_charge(U1), Some(1000));
}

#[test]
fn test_freeze_fails_closed() {
    init();
    let config = PowerConfig::default();
    let policy = PhasedFieldPolicy::new(&config);
    let manager = DimensionManager::new();

    let mut short = freeze_fixture(Some(999));
    freeze(&mut short.world, &manager, &config, Some(&policy as &dyn SustainPolicy));
    assert_eq!(short.world.active_entities(), short.players);

    let mut no_policy = freeze_fixture(Some(1_000_000));
    let outcome = freeze(&mut no_policy.world, &manager, &config, None);
    assert!(outcome.anchors.is_empty());
    assert_eq!(no_policy.world.active_entities(), no_policy.players);
}

#[test]
fn test_freeze_with_disabled_range_keeps_only_players() {
    init();
    let config = PowerConfig {
        phased_field_range: 0,
        ..PowerConfig::default()
    };
    let policy = PhasedFieldPolicy::new(&config);
    let mut fixture = freeze_fixture(Some(1_000_000));
    let outcome = freeze(
        &mut fixture.world,
        &DimensionManager::new(),
        &config,
        Some(&policy as &dyn SustainPolicy),
    );
    assert!(outcome.anchors.is_empty());
    assert_eq!(fixture.world.active_entities(), fixture.players);
}

#[test]
fn test_free_sustaining_when_difficulty_is_off() {
    init();
    let config = PowerConfig {
        dimension_difficulty: -1,
        enable_dynamic_phase_cost: true,
        ..PowerConfig::default()
    };
    let policy = PhasedFieldPolicy::new(&config);
    let mut fixture = freeze_fixture(Some(0));
    let outcome = freeze(
        &mut fixture.world,
        &DimensionManager::new(),
        &config,
        Some(&policy as &dyn SustainPolicy),
    );
    assert_eq!(outcome.kept, fixture.kept);
}

#[test]
fn test_freeze_is_idempotent() {
    init();
    let config = PowerConfig::default();
    let policy = PhasedFieldPolicy::new(&config);
    let manager = DimensionManager::new();
    let mut fixture = freeze_fixture(Some(5000));

    freeze(&mut fixture.world, &manager, &config, Some(&policy as &dyn SustainPolicy));
    let once = fixture.world.active_entities();
    freeze(&mut fixture.world, &manager, &config, Some(&policy as &dyn SustainPolicy));
    assert_eq!(fixture.world.active_entities(), once);
    assert!(fixture.world.active_tiles().is_empty());
}

#[test]
fn test_unfreeze_restores_the_active_sets() {
    init();
    let config = PowerConfig::default();
    let policy = PhasedFieldPolicy::new(&config);
    let mut fixture = freeze_fixture(Some(5000));
    let entities = fixture.world.active_entities();
    let tiles = fixture.world.active_tiles();

    freeze(
        &mut fixture.world,
        &DimensionManager::new(),
        &config,
        Some(&policy as &dyn SustainPolicy),
    );
    fixture.world.mark_chunks_unloaded();
    unfreeze(&mut fixture.world);

    assert_eq!(fixture.world.active_entities(), entities);
    assert_eq!(fixture.world.active_tiles(), tiles);
    assert!(fixture.world.is_chunk_loaded(ChunkPos::new(0, 0)));
    assert!(fixture.world.is_chunk_loaded(ChunkPos::new(2, -1)));
}

#[test]
fn test_ticker_freezes_when_power_runs_out() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let id = manager
        .create(
            &mut server.host(),
            &TestWorldContext::default(),
            descriptor("biome=plains", 5),
            "Alpha",
            "",
            None,
        )
        .expect("id");
    let mut world = TestWorld::new(id);
    let entity = world.spawn_entity(at(3.0, 64.0, 3.0));
    server.worlds.load(world);

    let config = PowerConfig::default();
    let policy: &dyn SustainPolicy = &PhasedFieldPolicy::new(&config);
    let mut ledger = PowerLedger::new();
    ledger.set_energy_level(id, 60);
    let mut ticker = DimensionTicker::new();

    let mut pass = |ledger: &mut PowerLedger, server: &mut TestServer| {
        for _ in 0..9 {
            assert!(!ticker.tick(&manager, ledger, &mut server.worlds, &config, Some(policy)));
        }
        assert!(ticker.tick(&manager, ledger, &mut server.worlds, &config, Some(policy)));
        ticker.is_frozen(id)
    };

    assert!(!pass(&mut ledger, &mut server));
    assert_eq!(ledger.energy_level(id), 10);

    assert!(pass(&mut ledger, &mut server));
    assert_eq!(ledger.energy_level(id), -40);
    let world = server.worlds.get(id).expect("loaded");
    assert!(world.active_entities().is_empty());

    ledger.set_energy_level(id, 1000);
    assert!(!pass(&mut ledger, &mut server));
    assert_eq!(ledger.energy_level(id), 950);
    let world = server.worlds.get(id).expect("loaded");
    assert!(world.active_entities().contains(&entity));
}

#[test]
fn test_ticker_charges_sustaining_players() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let id = create(&mut server, &mut manager, "biome=plains", "Alpha", None);
    let mut world = TestWorld::new(id);
    world.add_player(U1, at(0.5, 64.0, 0.5), Some(2500));
    let pet = world.spawn_entity(at(1.5, 64.0, 0.5));
    server.worlds.load(world);

    let config = PowerConfig {
        max_ticks: 1,
        ..PowerConfig::default()
    };
    let policy: &dyn SustainPolicy = &PhasedFieldPolicy::new(&config);
    let mut ledger = PowerLedger::new();
    let mut ticker = DimensionTicker::new();

    assert!(ticker.tick(&manager, &mut ledger, &mut server.worlds, &config, Some(policy)));
    assert!(ticker.is_frozen(id));
    let world = server.worlds.get(id).expect("loaded");
    assert_eq!(world.sustain_charge(U1), Some(2400));
    assert!(world.active_entities().contains(&pet));

    assert!(ledger.contains(id));

    manager.remove(&mut server.host(), id);
    ticker.tick(&manager, &mut ledger, &mut server.worlds, &config, Some(policy));
    assert!(!ticker.is_frozen(id));
    assert!(!ledger.contains(id));
}

#[derive(Default)]
struct TestSender {
    messages: RefCell<Vec<String>>,
    denied: bool,
}

impl CommandSender for TestSender {
    fn send_message(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }

    fn has_permission(&self, _permission: &str) -> bool {
        !self.denied
    }
}

#[test]
fn test_list_prints_worlds_and_dimensions() {
    init();
    let mut server = TestServer::new();
    let mut manager = DimensionManager::new();
    let a = create(&mut server, &mut manager, "biome=plains", "Alpha", Some(U1));
    let b = create(&mut server, &mut manager, "biome=desert", "Beta", None);
    server.worlds.load(TestWorld::new(a));
    let mut ledger = PowerLedger::new();
    ledger.set_energy_level(a, 500);

    let sender = TestSender::default();
    let mut context = CommandContext {
        sender: &sender,
        manager: &manager,
        ledger: &ledger,
        worlds: &server.worlds,
    };
    CommandDispatcher::default().handle_command(&mut context, "list");

    assert_eq!(
        *sender.messages.borrow(),
        vec![
            "Loaded: id:0, overworld".to_string(),
            format!("Loaded: id:{a}, rift_generic"),
            format!("Rift: id:{a}, Alpha (power 500) (owner Steve)"),
            format!("Rift: id:{b}, Beta (power 0)"),
        ]
    );
}

#[test]
fn test_dispatcher_reports_failures() {
    init();
    let server = TestServer::new();
    let manager = DimensionManager::new();
    let ledger = PowerLedger::new();
    let dispatcher = CommandDispatcher::default();

    let sender = TestSender {
        denied: true,
        ..TestSender::default()
    };
    let mut context = CommandContext {
        sender: &sender,
        manager: &manager,
        ledger: &ledger,
        worlds: &server.worlds,
    };
    assert_eq!(
        dispatcher.execute(&mut context, "list"),
        Err(CommandError::PermissionDenied)
    );
    assert!(matches!(
        dispatcher.execute(&mut context, "teleport"),
        Err(CommandError::CommandFailed(_))
    ));
    assert!(matches!(
        dispatcher.execute(&mut context, "   "),
        Err(CommandError::CommandFailed(_))
    ));

    dispatcher.handle_command(&mut context, "list");
    assert_eq!(sender.messages.borrow().len(), 1);
    assert_eq!(
        dispatcher.help(),
        vec![("list", "Lists the loaded worlds and every dynamic dimension.")]
    );
}

#[test]
fn test_unregistered_command_is_gone() {
    init();
    let server = TestServer::new();
    let manager = DimensionManager::new();
    let ledger = PowerLedger::new();
    let mut dispatcher = CommandDispatcher::default();
    dispatcher.unregister(&["list"]);

    let sender = TestSender::default();
    let mut context = CommandContext {
        sender: &sender,
        manager: &manager,
        ledger: &ledger,
        worlds: &server.worlds,
    };
    assert_eq!(
        dispatcher.execute(&mut context, "list"),
        Err(CommandError::CommandFailed("Command list does not exist".to_string()))
    );
    assert!(dispatcher.help().is_empty());
}
