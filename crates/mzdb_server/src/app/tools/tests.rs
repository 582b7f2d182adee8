    use std::fs;
    use std::path::Path;

    use mzdb::ProjectPaths;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn seed_project(root: &Path) {
        let data = root.join("data");
        fs::create_dir_all(&data).expect("mkdir data");
        let files = [
            ("System.json", json!({"gameTitle": "Demo", "versionId": 100})),
            (
                "Items.json",
                json!([null, {"id": 1, "name": "Potion"}, {"id": 2, "name": "Ether"}]),
            ),
            ("Actors.json", json!([null, {"id": 1, "name": "Reid", "classId": 1}])),
            (
                "Weapons.json",
                json!([
                    null,
                    {"id": 1, "name": "Sword"},
                    {"id": 2, "name": ""},
                    {"id": 3, "name": "Axe"}
                ]),
            ),
            (
                "MapInfos.json",
                json!([
                    null,
                    {"id": 1, "expanded": false, "name": "World", "order": 2, "parentId": 0, "scrollX": 0, "scrollY": 0},
                    {"id": 2, "expanded": false, "name": "Town", "order": 5, "parentId": 1, "scrollX": 0, "scrollY": 0},
                    null
                ]),
            ),
        ];
        for (name, value) in files {
            fs::write(
                data.join(name),
                serde_json::to_vec_pretty(&value).expect("encode"),
            )
            .expect("write fixture");
        }
    }

    fn open_project() -> (TempDir, ProjectDatabase) {
        let temp = TempDir::new().expect("temp");
        seed_project(temp.path());
        let db = ProjectDatabase::open(ProjectPaths::new(temp.path(), None), 1);
        (temp, db)
    }

    fn call(db: &ProjectDatabase, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        ToolRegistry::with_builtins().dispatch(db, tool, &args)
    }

    fn read_data(root: &Path, name: &str) -> Value {
        let raw = fs::read_to_string(root.join("data").join(name)).expect("read data file");
        serde_json::from_str(&raw).expect("parse data file")
    }

    #[test]
    fn create_item_appends_effects_and_bumps_version() {
        let (temp, db) = open_project();

        let output = call(
            &db,
            "create_item",
            json!({"name": "Hi-Potion", "price": 150, "hpRecoveryPercent": 50, "addStateId": 7}),
        )
        .expect("create item");

        assert_eq!(output.data["id"], 3);
        let items = read_data(temp.path(), "Items.json");
        let items = items.as_array().expect("array");
        assert_eq!(items.len(), 4);
        let created = &items[3];
        assert_eq!(created["id"], 3);
        assert_eq!(created["name"], "Hi-Potion");
        assert_eq!(created["price"], 150);

        let effects = created["effects"].as_array().expect("effects");
        let recover = effects
            .iter()
            .filter(|effect| effect["code"] == 11)
            .collect::<Vec<_>>();
        assert_eq!(recover.len(), 1);
        assert_eq!(recover[0]["value1"], 0.5);
        let add_state = effects
            .iter()
            .filter(|effect| effect["code"] == 21)
            .collect::<Vec<_>>();
        assert_eq!(add_state.len(), 1);
        assert_eq!(add_state[0]["dataId"], 7);
        assert_eq!(add_state[0]["value1"], 1.0);

        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 101);
        assert!(temp.path().join("data/Items.json.bak").exists());
    }

    #[test]
    fn hp_percent_and_flat_share_one_effect() {
        let (temp, db) = open_project();
        call(
            &db,
            "create_item",
            json!({"name": "Mega", "hpRecoveryPercent": 25, "hpRecoveryFlat": 300, "tpGain": 10}),
        )
        .expect("create item");

        let items = read_data(temp.path(), "Items.json");
        let effects = items[3]["effects"].as_array().expect("effects");
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0]["code"], 11);
        assert_eq!(effects[0]["value1"], 0.25);
        assert_eq!(effects[0]["value2"], 300.0);
        assert_eq!(effects[1]["code"], 13);
    }

    #[test]
    fn create_item_rejects_bad_shorthands_without_writing() {
        let (temp, db) = open_project();
        let before = fs::read_to_string(temp.path().join("data/Items.json")).expect("read");

        let error = call(
            &db,
            "create_item",
            json!({"name": "Broken", "hpRecoveryPercent": 250}),
        )
        .expect_err("percent out of range");
        assert_eq!(error.category(), "validation_rejection");

        let error = call(&db, "create_item", json!({"name": "Typo", "hpRecovery": 5}))
            .expect_err("unknown field");
        assert!(matches!(error, ToolError::InvalidArgs { .. }));

        assert_eq!(
            fs::read_to_string(temp.path().join("data/Items.json")).expect("read"),
            before
        );
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 100);
    }

    #[test]
    fn create_map_writes_body_and_index_entry() {
        let (temp, db) = open_project();

        let output = call(
            &db,
            "create_map",
            json!({"name": "Forest", "width": 20, "height": 15, "parentId": 2, "displayName": "Deep Woods"}),
        )
        .expect("create map");

        assert_eq!(output.data["id"], 3);
        assert_eq!(output.data["order"], 6);

        let body = read_data(temp.path(), "Map003.json");
        let tiles = body["data"].as_array().expect("tile data");
        assert_eq!(tiles.len(), 20 * 15 * 6);
        assert!(tiles.iter().all(|tile| tile == 0));
        assert_eq!(body["displayName"], "Deep Woods");
        assert_eq!(body["events"], json!([null]));

        let index = read_data(temp.path(), "MapInfos.json");
        assert_eq!(index.as_array().expect("index").len(), 4);
        assert_eq!(index[3]["id"], 3);
        assert_eq!(index[3]["name"], "Forest");
        assert_eq!(index[3]["parentId"], 2);
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 101);

        let summary = call(&db, "get_map", json!({"id": 3})).expect("get map");
        assert_eq!(summary.data["width"], 20);
        assert_eq!(summary.data["events"], 0);
    }

    #[test]
    fn create_map_validates_dimensions_and_parent() {
        let (temp, db) = open_project();
        for args in [
            json!({"name": "Flat", "width": 0, "height": 10}),
            json!({"name": "Huge", "width": 257, "height": 10}),
            json!({"name": "Orphan", "width": 10, "height": 10, "parentId": 3}),
        ] {
            let error = call(&db, "create_map", args).expect_err("rejected");
            assert_eq!(error.category(), "validation_rejection");
        }
        let error = call(&db, "create_map", json!({"name": "x", "width": "wide", "height": 1}))
            .expect_err("bad type");
        assert!(error.to_string().contains("width"));
        assert!(!temp.path().join("data/Map003.json").exists());
    }

    #[test]
    fn shrinking_through_named_records_leaves_file_unchanged() {
        let (temp, db) = open_project();
        let weapons_path = temp.path().join("data/Weapons.json");
        let before = fs::read_to_string(&weapons_path).expect("read");

        let error = call(&db, "resize_collection", json!({"kind": "weapon", "max": 2}))
            .expect_err("Axe sits at id 3");
        assert_eq!(error.category(), "validation_rejection");
        assert_eq!(fs::read_to_string(&weapons_path).expect("read"), before);
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 100);

        call(&db, "resize_collection", json!({"kind": "weapons", "max": 6})).expect("grow");
        let weapons = read_data(temp.path(), "Weapons.json");
        assert_eq!(weapons.as_array().expect("array").len(), 7);
        assert_eq!(weapons[6]["id"], 6);
        assert_eq!(weapons[6]["name"], "");
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 101);
    }

    #[test]
    fn shrinking_through_unnamed_authored_record_is_rejected() {
        let (temp, db) = open_project();
        let weapons_path = temp.path().join("data/Weapons.json");
        fs::write(
            &weapons_path,
            r#"[null,{"id":1,"name":"Sword"},{"id":2,"name":"","price":900,"note":"legendary <tag>","description":"authored"}]"#,
        )
        .expect("seed weapons");
        let before = fs::read_to_string(&weapons_path).expect("read");

        let error = call(&db, "resize_collection", json!({"kind": "weapon", "max": 1}))
            .expect_err("record 2 carries authored fields");
        assert_eq!(error.category(), "validation_rejection");
        assert_eq!(fs::read_to_string(&weapons_path).expect("read"), before);
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 100);

        // Template rows added by a grow may be dropped again.
        call(&db, "resize_collection", json!({"kind": "weapon", "max": 5})).expect("grow");
        call(&db, "resize_collection", json!({"kind": "weapon", "max": 2})).expect("shrink");
        let weapons = read_data(temp.path(), "Weapons.json");
        assert_eq!(weapons.as_array().expect("array").len(), 3);
        assert_eq!(weapons[2]["price"], 900);
    }

    #[test]
    fn oversized_resize_is_rejected_without_panicking() {
        let (temp, db) = open_project();
        let before = fs::read_to_string(temp.path().join("data/Weapons.json")).expect("read");
        for max in [json!(u64::MAX), json!(usize::MAX), json!(10_000)] {
            let error = call(&db, "resize_collection", json!({"kind": "weapon", "max": max}))
                .expect_err("out of range");
            assert_eq!(error.category(), "validation_rejection");
        }
        assert_eq!(
            fs::read_to_string(temp.path().join("data/Weapons.json")).expect("read"),
            before
        );
    }

    #[test]
    fn item_file_layout_is_stable_across_writers() {
        let (temp, db) = open_project();
        let items_path = temp.path().join("data/Items.json");
        call(&db, "create_item", json!({"name": "Hi-Potion", "price": 150})).expect("create");
        let after_typed = fs::read_to_string(&items_path).expect("read");

        call(
            &db,
            "update_entity",
            json!({"kind": "item", "id": 3, "fields": {"price": 777}}),
        )
        .expect("update");
        let after_free_form = fs::read_to_string(&items_path).expect("read");

        assert_eq!(
            after_free_form,
            after_typed.replace("\"price\": 150", "\"price\": 777")
        );

        call(&db, "create_item", json!({"name": "Elixir"})).expect("second create");
        let after_second = fs::read_to_string(&items_path).expect("read");
        let first_record = |text: &str| {
            let value: Value = serde_json::from_str(text).expect("parse");
            serde_json::to_string_pretty(&value[1]).expect("encode")
        };
        assert!(after_second.contains(&first_record(&after_free_form).replace('\n', "\n  ")));
    }

    #[test]
    fn three_creates_bump_three_times() {
        let (temp, db) = open_project();
        for name in ["Aria", "Bram", "Cato"] {
            call(
                &db,
                "create_entity",
                json!({"kind": "actor", "fields": {"name": name}}),
            )
            .expect("create actor");
        }
        let actors = read_data(temp.path(), "Actors.json");
        assert_eq!(actors.as_array().expect("array").len(), 5);
        assert_eq!(actors[4]["name"], "Cato");
        assert_eq!(actors[4]["id"], 4);
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 103);
    }

    #[test]
    fn update_entity_keeps_identity() {
        let (temp, db) = open_project();
        let error = call(
            &db,
            "update_entity",
            json!({"kind": "actor", "id": 1, "fields": {"id": 9, "name": "Nope"}}),
        )
        .expect_err("id change");
        assert_eq!(error.category(), "validation_rejection");

        call(
            &db,
            "update_entity",
            json!({"kind": "Actors.json", "id": 1, "fields": {"nickname": "Scout"}}),
        )
        .expect("update");
        let actors = read_data(temp.path(), "Actors.json");
        assert_eq!(actors[1]["nickname"], "Scout");
        assert_eq!(actors[1]["name"], "Reid");
        assert_eq!(actors[1]["classId"], 1);

        let missing = call(&db, "update_entity", json!({"kind": "actor", "id": 7, "fields": {"name": "x"}}))
            .expect_err("no such actor");
        assert_eq!(missing.category(), "validation_rejection");
    }

    #[test]
    fn listing_a_missing_collection_is_empty_with_note() {
        let (_temp, db) = open_project();
        let output = call(&db, "list_entities", json!({"kind": "enemy"})).expect("list");
        assert_eq!(output.data["records"], json!([]));
        assert!(output.message.contains("Enemies.json"));

        let items = call(&db, "list_entities", json!({"kind": "item"})).expect("list items");
        assert_eq!(items.data["records"].as_array().expect("records").len(), 2);
        assert_eq!(items.data["max"], 2);

        let error = call(&db, "create_entity", json!({"kind": "enemy", "fields": {"name": "Slime"}}))
            .expect_err("missing file");
        assert_eq!(error.category(), "read_failure");
    }

    #[test]
    fn corrupt_collection_rejects_updates() {
        let (temp, db) = open_project();
        fs::write(
            temp.path().join("data/Skills.json"),
            r#"[null,{"id":1,"name":"Attack"},{"id":5,"name":"Guard"}]"#,
        )
        .expect("corrupt skills");
        let error = call(&db, "create_entity", json!({"kind": "skill", "fields": {"name": "Fire"}}))
            .expect_err("drifted ids");
        assert_eq!(error.category(), "validation_rejection");
        assert!(error.to_string().contains("corrupt"));
    }

    #[test]
    fn install_plugin_writes_script_and_registry() {
        let (temp, db) = open_project();
        let output = call(
            &db,
            "install_plugin",
            json!({
                "name": "ClockHud",
                "code": "(() => {})();\n",
                "description": "Shows a clock",
                "author": "Studio",
                "parameters": {"x": "12"}
            }),
        )
        .expect("install");
        assert_eq!(output.data["replaced"], false);

        let script = fs::read_to_string(temp.path().join("js/plugins/ClockHud.js")).expect("script");
        assert!(script.starts_with("/*:\n * @target MZ\n * @plugindesc Shows a clock"));
        assert!(script.ends_with("(() => {})();\n"));

        let listed = call(&db, "list_plugins", json!({})).expect("list");
        assert_eq!(listed.data[0]["name"], "ClockHud");
        assert_eq!(listed.data[0]["status"], true);
        assert_eq!(listed.data[0]["parameters"]["x"], "12");

        call(&db, "set_plugin_enabled", json!({"name": "ClockHud", "enabled": false}))
            .expect("disable");
        let listed = call(&db, "list_plugins", json!({})).expect("list");
        assert_eq!(listed.data[0]["status"], false);
        assert_eq!(read_data(temp.path(), "System.json")["versionId"], 102);

        let reinstalled = call(
            &db,
            "install_plugin",
            json!({"name": "ClockHud", "code": "/*:\n * @target MZ\n */\nvoid 0;\n"}),
        )
        .expect("reinstall");
        assert_eq!(reinstalled.data["replaced"], true);
        let listed = call(&db, "list_plugins", json!({})).expect("list");
        assert_eq!(listed.data.as_array().expect("entries").len(), 1);
    }

    #[test]
    fn install_plugin_rejects_path_like_names() {
        let (temp, db) = open_project();
        for name in ["../evil", "my plugin", ""] {
            let error = call(&db, "install_plugin", json!({"name": name, "code": "void 0;"}))
                .expect_err("invalid name");
            assert_eq!(error.category(), "validation_rejection");
        }
        assert!(!temp.path().join("js").exists());
    }

    #[test]
    fn engine_scope_without_engine_root_is_unavailable() {
        let (temp, db) = open_project();
        let faces = temp.path().join("img/faces");
        fs::create_dir_all(&faces).expect("mkdir faces");
        fs::write(faces.join("Actor1.png"), b"png").expect("face");
        fs::write(faces.join("notes.txt"), b"txt").expect("note");

        let project = call(&db, "scan_resources", json!({"category": "faces"})).expect("scan");
        assert_eq!(project.data["files"], json!(["Actor1"]));

        let empty = call(&db, "scan_resources", json!({"category": "audio/bgm"})).expect("scan");
        assert_eq!(empty.data["files"], json!([]));

        let error = call(
            &db,
            "scan_resources",
            json!({"category": "faces", "scope": "engine"}),
        )
        .expect_err("no engine root");
        assert!(matches!(error, ToolError::Unavailable(_)));
        assert_eq!(error.category(), "feature_unavailable");
    }

    #[test]
    fn engine_scope_reads_the_engine_root() {
        let project = TempDir::new().expect("project");
        let engine = TempDir::new().expect("engine");
        seed_project(project.path());
        let bgm = engine.path().join("audio/bgm");
        fs::create_dir_all(&bgm).expect("mkdir bgm");
        fs::write(bgm.join("Theme1.ogg"), b"ogg").expect("bgm");
        let db = ProjectDatabase::open(
            ProjectPaths::new(project.path(), Some(engine.path().to_path_buf())),
            1,
        );

        let output = call(
            &db,
            "scan_resources",
            json!({"category": "bgm", "scope": "engine"}),
        )
        .expect("engine scan");
        assert_eq!(output.data["files"], json!(["Theme1"]));
    }

    #[test]
    fn summary_counts_named_records() {
        let (_temp, db) = open_project();
        let output = call(&db, "database_summary", json!({})).expect("summary");
        assert_eq!(output.data["records"]["item"], 2);
        assert_eq!(output.data["records"]["weapon"], 2);
        assert_eq!(output.data["records"]["enemy"], Value::Null);
        assert_eq!(output.data["maps"], 2);
        assert_eq!(output.data["plugins"]["registered"], 0);
        assert_eq!(output.data["versionId"], 100);
    }

    #[test]
    fn registry_dispatch_and_help() {
        let (_temp, db) = open_project();
        let help = call(&db, "HELP", json!({})).expect("help");
        let names = help
            .data
            .as_array()
            .expect("tools")
            .iter()
            .map(|tool| tool["name"].as_str().expect("name").to_string())
            .collect::<Vec<_>>();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "list_entities");
        assert_eq!(names[13], "database_summary");

        assert!(call(&db, "List_Maps", json!({})).is_ok());
        let error = call(&db, "drop_tables", json!({})).expect_err("unknown");
        assert_eq!(error.category(), "invalid_request");

        let mut registry = ToolRegistry::with_builtins();
        assert!(registry
            .register("list_maps", "dup", "{}", |_, _| Ok(ToolOutput::new("x", Value::Null)))
            .is_err());
        assert!(registry
            .register("help", "shadow", "{}", |_, _| Ok(ToolOutput::new("x", Value::Null)))
            .is_err());
    }
