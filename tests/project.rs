// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use once_cell::sync::Lazy;

use tileweave::{
    decode, encode, Appearance, Color, Entity, EntityKind, IdGen, ImageData, Layer,
    LayerBackground, Opacity, OriginX, OriginY, Pose, ProjectMetadata, Scene, SvgChild, SvgPath,
    Transform,
};

// The encoded sample project, built once and shared by the tests below.
static SAMPLE_DOC: Lazy<String> =
    Lazy::new(|| encode(&grouped_scene().0, &sample_metadata()).unwrap());

fn sample_metadata() -> ProjectMetadata {
    ProjectMetadata {
        tile_size: 200.0,
        created_at: "2024-05-01T10:00:00Z".to_string(),
        modified_at: "2024-05-02T11:30:00Z".to_string(),
    }
}

fn sample_scene() -> (Scene, IdGen) {
    let mut ids = IdGen::new();
    let mut scene = Scene::new(&mut ids);
    let bottom = scene.layers.first().unwrap().id.clone();

    let mut middle = Layer::new(ids.next_layer(), "Middle");
    middle.background = Some(LayerBackground {
        color: Color::new_rgb(240, 240, 220),
        alpha: Opacity::new_clamped(0.8),
    });
    let middle_id = middle.id.clone();
    scene.layers.insert(middle);

    let mut top = Layer::new(ids.next_layer(), "Top");
    top.locked = true;
    let top_id = top.id.clone();
    scene.layers.insert(top);

    // A rect with a non-trivial pose.
    let mut rect = Entity::new(
        ids.next_entity(),
        bottom.clone(),
        EntityKind::Rect {
            width: 40.0,
            height: 30.0,
        },
    );
    rect.pose = Pose {
        left: 250.0,
        top: 260.0,
        scale_x: 1.5,
        scale_y: 2.0,
        angle: 30.0,
        flip_x: true,
        flip_y: false,
        skew_x: 10.0,
        skew_y: 0.0,
        origin_x: OriginX::Center,
        origin_y: OriginY::Bottom,
    };
    rect.appearance = Appearance {
        fill: Some(Color::new_rgb(200, 30, 40)),
        stroke: Some(Color::black()),
        stroke_width: 2.5,
        opacity: Opacity::new_clamped(0.7),
    };
    scene.store.add(rect);

    let mut circle = Entity::new(
        ids.next_entity(),
        bottom.clone(),
        EntityKind::Circle { radius: 17.0 },
    );
    circle.pose = Pose::at(300.0, 310.0);
    circle.visible = false;
    scene.store.add(circle);

    let mut path = Entity::new(
        ids.next_entity(),
        middle_id.clone(),
        EntityKind::Path {
            data: SvgPath::from_str("M0 0C10 0 20 10 20 20l-5 5z").unwrap(),
        },
    );
    path.pose = Pose::at(220.0, 330.0);
    path.name = Some("squiggle".to_string());
    scene.store.add(path);

    let mut image = Entity::new(
        ids.next_entity(),
        middle_id.clone(),
        EntityKind::Image {
            data: ImageData::new(2, 2, vec![10, 20, 30, 255, 1, 2, 3, 4, 0, 0, 0, 0, 9, 9, 9, 9])
                .unwrap(),
        },
    );
    image.pose = Pose::at(350.0, 350.0);
    scene.store.add(image);

    let mut group_entity = Entity::new(
        ids.next_entity(),
        top_id,
        EntityKind::SvgGroup {
            children: vec![SvgChild {
                data: SvgPath::from_str("M0 0H10V10H0z").unwrap(),
                transform: Transform::from_scale(2.0, 2.0),
                appearance: Appearance::filled(Color::new_rgb(5, 6, 7)),
            }],
        },
    );
    group_entity.pose = Pose::at(210.0, 210.0);
    group_entity.locked = true;
    scene.store.add(group_entity);

    (scene, ids)
}

fn ids_in_paint_order(scene: &Scene) -> Vec<String> {
    scene.paint_order().iter().map(|e| e.id.clone()).collect()
}

// The sample scene plus two groups: one on the bottom layer, one
// forged on the middle layer from two extra rects. Deterministic, so
// every rebuild encodes to the same document.
fn grouped_scene() -> (Scene, IdGen) {
    let (mut scene, mut ids) = sample_scene();

    let bottom = scene.layers.first().unwrap().id.clone();
    let middle = scene
        .layers
        .iter()
        .find(|l| l.name == "Middle")
        .unwrap()
        .id
        .clone();

    let (a, b) = {
        let by_layer = scene.store.by_layer(&bottom);
        (by_layer[0].id.clone(), by_layer[1].id.clone())
    };
    scene
        .groups
        .create(&mut scene.store, ids.next_group(), &[a, b], None)
        .unwrap();

    let mut extra_ids = Vec::new();
    for _ in 0..2 {
        let mut extra = Entity::new(
            ids.next_entity(),
            middle.clone(),
            EntityKind::Rect {
                width: 12.0,
                height: 12.0,
            },
        );
        extra.pose = Pose::at(230.0, 230.0);
        extra_ids.push(extra.id.clone());
        scene.store.add(extra);
    }
    scene
        .groups
        .create(
            &mut scene.store,
            ids.next_group(),
            &extra_ids,
            Some("pair".to_string()),
        )
        .unwrap();

    (scene, ids)
}

#[test]
fn full_round_trip() {
    let (scene, _) = grouped_scene();
    let metadata = sample_metadata();

    let mut restored = Scene::default();
    let mut restored_ids = IdGen::new();
    let restored_metadata = decode(&SAMPLE_DOC, &mut restored, &mut restored_ids).unwrap();

    assert_eq!(restored_metadata.tile_size, 200.0);
    assert_eq!(restored_metadata.created_at, metadata.created_at);
    assert_eq!(restored_metadata.modified_at, metadata.modified_at);

    // Layers: same count, names, order, flags, backgrounds.
    assert_eq!(restored.layers.len(), scene.layers.len());
    for (original, loaded) in scene.layers.iter().zip(restored.layers.iter()) {
        assert_eq!(original.id, loaded.id);
        assert_eq!(original.name, loaded.name);
        assert_eq!(original.order, loaded.order);
        assert_eq!(original.visible, loaded.visible);
        assert_eq!(original.locked, loaded.locked);
        assert_eq!(original.background.is_some(), loaded.background.is_some());
    }

    // Entities: everything observable survives.
    assert_eq!(restored.store.len(), scene.store.len());
    for original in scene.store.all() {
        let loaded = restored.store.get(&original.id).unwrap();
        assert_eq!(original, loaded, "entity {}", original.id);
    }

    // Groups: bidirectional membership survives.
    for gid in scene.groups.ids() {
        assert_eq!(
            scene.groups.members_of(gid).unwrap(),
            restored.groups.members_of(gid).unwrap(),
            "group {gid}"
        );
        for member in restored.groups.members_of(gid).unwrap() {
            assert_eq!(restored.groups.group_of(member), Some(gid));
        }
    }

    // Global paint order is preserved.
    assert_eq!(ids_in_paint_order(&scene), ids_in_paint_order(&restored));
}

#[test]
fn encode_is_deterministic() {
    // An independently rebuilt scene encodes byte-for-byte like the
    // shared fixture.
    let (scene, _) = grouped_scene();
    assert_eq!(encode(&scene, &sample_metadata()).unwrap(), *SAMPLE_DOC);
}

#[test]
fn decode_failure_leaves_scene_alone() {
    let (mut scene, mut ids) = grouped_scene();
    let before = ids_in_paint_order(&scene);

    // Truncated document.
    let truncated = &SAMPLE_DOC[..SAMPLE_DOC.len() / 2];
    assert!(decode(truncated, &mut scene, &mut ids).is_err());

    assert_eq!(ids_in_paint_order(&scene), before);
}
