// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::canvas::ImageData;
use crate::entity::{Appearance, Entity, EntityKind, OriginX, OriginY, Pose, SvgChild};
use crate::layer::{Layer, LayerBackground};
use crate::scene::Scene;
use crate::{Color, Error, IdGen, Opacity, SvgPath, Transform};

/// The project format version.
pub const FORMAT_VERSION: &str = "1.0.0";

/// The key-value key autosave writes under.
pub const AUTOSAVE_KEY: &str = "autosave";

/// Project-level data that lives outside the scene.
#[derive(Clone, Debug)]
pub struct ProjectMetadata {
    /// The tile side length.
    pub tile_size: f64,
    /// Creation timestamp, an opaque ISO-8601 string from the host.
    pub created_at: String,
    /// Modification timestamp, ditto.
    pub modified_at: String,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        ProjectMetadata {
            tile_size: 200.0,
            created_at: String::new(),
            modified_at: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct ProjectDoc {
    version: String,
    #[serde(rename = "appVersion")]
    app_version: String,
    metadata: MetadataDoc,
    layers: Vec<LayerDoc>,
    #[serde(rename = "entityGroups")]
    entity_groups: Vec<GroupDoc>,
}

#[derive(Serialize, Deserialize, Debug)]
struct MetadataDoc {
    #[serde(rename = "tileSize")]
    tile_size: f64,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(rename = "modifiedAt")]
    modified_at: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct LayerDoc {
    id: String,
    name: String,
    order: u32,
    visible: bool,
    locked: bool,
    background: Option<BackgroundDoc>,
    entities: Vec<EntityDoc>,
}

#[derive(Serialize, Deserialize, Debug)]
struct BackgroundDoc {
    color: String,
    alpha: f64,
}

#[derive(Serialize, Deserialize, Debug)]
struct EntityDoc {
    #[serde(rename = "mirrorGroupId")]
    mirror_group_id: String,
    order: u32,
    #[serde(rename = "fabricObject")]
    fabric_object: FabricObjectDoc,
}

#[derive(Serialize, Deserialize, Debug)]
struct GroupDoc {
    id: String,
    name: String,
    #[serde(rename = "memberMirrorGroupIds")]
    member_mirror_group_ids: Vec<String>,
    #[serde(rename = "layerId")]
    layer_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct FabricObjectDoc {
    #[serde(flatten)]
    shape: ShapeDoc,
    left: f64,
    top: f64,
    #[serde(rename = "scaleX")]
    scale_x: f64,
    #[serde(rename = "scaleY")]
    scale_y: f64,
    angle: f64,
    #[serde(rename = "flipX")]
    flip_x: bool,
    #[serde(rename = "flipY")]
    flip_y: bool,
    #[serde(rename = "skewX")]
    skew_x: f64,
    #[serde(rename = "skewY")]
    skew_y: f64,
    #[serde(rename = "originX")]
    origin_x: String,
    #[serde(rename = "originY")]
    origin_y: String,
    fill: Option<String>,
    stroke: Option<String>,
    #[serde(rename = "strokeWidth")]
    stroke_width: f64,
    opacity: f64,
    visible: bool,
    locked: bool,
    name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
enum ShapeDoc {
    #[serde(rename = "path")]
    Path { d: String },
    #[serde(rename = "rect")]
    Rect { width: f64, height: f64 },
    #[serde(rename = "circle")]
    Circle { radius: f64 },
    #[serde(rename = "image")]
    Image {
        src: String,
        width: u32,
        height: u32,
    },
    #[serde(rename = "svgGroup")]
    SvgGroup { children: Vec<SvgChildDoc> },
}

#[derive(Serialize, Deserialize, Debug)]
struct SvgChildDoc {
    d: String,
    transform: String,
    fill: Option<String>,
    stroke: Option<String>,
    #[serde(rename = "strokeWidth")]
    stroke_width: f64,
    opacity: f64,
}

/// Serializes the scene into the `.tiles` JSON document.
///
/// The output is deterministic: fixed field order, layers bottom-up,
/// entities per layer in z-order.
pub fn encode(scene: &Scene, metadata: &ProjectMetadata) -> Result<String, Error> {
    let mut layers = Vec::new();
    for layer in scene.layers.iter() {
        let mut entities = Vec::new();
        for (order, entity) in scene.store.by_layer(&layer.id).iter().enumerate() {
            entities.push(EntityDoc {
                mirror_group_id: entity.id.clone(),
                order: order as u32,
                fabric_object: encode_entity(entity),
            });
        }

        layers.push(LayerDoc {
            id: layer.id.clone(),
            name: layer.name.clone(),
            order: layer.order as u32,
            visible: layer.visible,
            locked: layer.locked,
            background: layer.background.map(|b| BackgroundDoc {
                color: b.color.to_hex(),
                alpha: b.alpha.get(),
            }),
            entities,
        });
    }

    let mut entity_groups = Vec::new();
    let mut group_ids: Vec<_> = scene.groups.ids().cloned().collect();
    group_ids.sort();
    for gid in group_ids {
        entity_groups.push(GroupDoc {
            id: gid.clone(),
            name: scene.groups.name_of(&gid).unwrap_or_default().to_string(),
            member_mirror_group_ids: scene
                .groups
                .members_of(&gid)
                .map(|m| m.to_vec())
                .unwrap_or_default(),
            layer_id: scene
                .groups
                .layer_of(&gid)
                .cloned()
                .unwrap_or_default(),
        });
    }

    let doc = ProjectDoc {
        version: FORMAT_VERSION.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        metadata: MetadataDoc {
            tile_size: metadata.tile_size,
            created_at: metadata.created_at.clone(),
            modified_at: metadata.modified_at.clone(),
        },
        layers,
        entity_groups,
    };

    serde_json::to_string_pretty(&doc).map_err(|e| Error::MalformedProject(e.to_string()))
}

/// Rebuilds the scene from a `.tiles` JSON document.
///
/// The store is cleared first; layers come back in declared order,
/// entities through their kind-specific constructors, groups by id.
pub fn decode(text: &str, scene: &mut Scene, ids: &mut IdGen) -> Result<ProjectMetadata, Error> {
    let doc: ProjectDoc =
        serde_json::from_str(text).map_err(|e| Error::MalformedProject(e.to_string()))?;

    // Build into a fresh scene first, so a malformed document leaves
    // the current one untouched.
    let mut fresh = Scene::default();

    let mut layers = doc.layers;
    layers.sort_by_key(|l| l.order);

    for layer_doc in &layers {
        let mut layer = Layer::new(layer_doc.id.clone(), layer_doc.name.clone());
        layer.visible = layer_doc.visible;
        layer.locked = layer_doc.locked;
        layer.background = match &layer_doc.background {
            Some(b) => Some(LayerBackground {
                color: Color::from_str(&b.color)?,
                alpha: Opacity::new_clamped(b.alpha),
            }),
            None => None,
        };
        fresh.layers.insert(layer);
        ids.bump_past(&layer_doc.id);
    }

    for layer_doc in &layers {
        let mut entities = Vec::new();
        for entity_doc in &layer_doc.entities {
            entities.push((
                entity_doc.order,
                decode_entity(entity_doc, &layer_doc.id)?,
            ));
        }
        entities.sort_by_key(|&(order, _)| order);

        for (_, entity) in entities {
            ids.bump_past(&entity.id);
            fresh.store.add(entity);
        }
    }

    for group in &doc.entity_groups {
        ids.bump_past(&group.id);
        fresh.groups.restore(
            &mut fresh.store,
            group.id.clone(),
            &group.member_mirror_group_ids,
            group.name.clone(),
            group.layer_id.clone(),
        );
    }

    *scene = fresh;

    Ok(ProjectMetadata {
        tile_size: doc.metadata.tile_size,
        created_at: doc.metadata.created_at,
        modified_at: doc.metadata.modified_at,
    })
}

fn encode_entity(entity: &Entity) -> FabricObjectDoc {
    let shape = match &entity.kind {
        EntityKind::Path { data } => ShapeDoc::Path { d: data.to_string() },
        EntityKind::Rect { width, height } => ShapeDoc::Rect {
            width: *width,
            height: *height,
        },
        EntityKind::Circle { radius } => ShapeDoc::Circle { radius: *radius },
        EntityKind::Image { data } => ShapeDoc::Image {
            src: base64::engine::general_purpose::STANDARD.encode(&data.rgba),
            width: data.width,
            height: data.height,
        },
        EntityKind::SvgGroup { children } => ShapeDoc::SvgGroup {
            children: children
                .iter()
                .map(|child| SvgChildDoc {
                    d: child.data.to_string(),
                    transform: transform_to_string(&child.transform),
                    fill: child.appearance.fill.map(|c| c.to_hex()),
                    stroke: child.appearance.stroke.map(|c| c.to_hex()),
                    stroke_width: child.appearance.stroke_width,
                    opacity: child.appearance.opacity.get(),
                })
                .collect(),
        },
    };

    FabricObjectDoc {
        shape,
        left: entity.pose.left,
        top: entity.pose.top,
        scale_x: entity.pose.scale_x,
        scale_y: entity.pose.scale_y,
        angle: entity.pose.angle,
        flip_x: entity.pose.flip_x,
        flip_y: entity.pose.flip_y,
        skew_x: entity.pose.skew_x,
        skew_y: entity.pose.skew_y,
        origin_x: origin_x_to_string(entity.pose.origin_x).to_string(),
        origin_y: origin_y_to_string(entity.pose.origin_y).to_string(),
        fill: entity.appearance.fill.map(|c| c.to_hex()),
        stroke: entity.appearance.stroke.map(|c| c.to_hex()),
        stroke_width: entity.appearance.stroke_width,
        opacity: entity.appearance.opacity.get(),
        visible: entity.visible,
        locked: entity.locked,
        name: entity.name.clone(),
    }
}

fn decode_entity(doc: &EntityDoc, layer_id: &str) -> Result<Entity, Error> {
    let fo = &doc.fabric_object;

    let kind = match &fo.shape {
        ShapeDoc::Path { d } => EntityKind::Path {
            data: SvgPath::from_str(d)?,
        },
        ShapeDoc::Rect { width, height } => EntityKind::Rect {
            width: *width,
            height: *height,
        },
        ShapeDoc::Circle { radius } => EntityKind::Circle { radius: *radius },
        ShapeDoc::Image { src, width, height } => {
            let rgba = base64::engine::general_purpose::STANDARD
                .decode(src)
                .map_err(|e| Error::MalformedProject(e.to_string()))?;
            let data = ImageData::new(*width, *height, rgba).ok_or_else(|| {
                Error::MalformedProject(format!(
                    "image byte count does not match {}x{}",
                    width, height
                ))
            })?;
            EntityKind::Image { data }
        }
        ShapeDoc::SvgGroup { children } => {
            let mut converted = Vec::new();
            for child in children {
                converted.push(SvgChild {
                    data: SvgPath::from_str(&child.d)?,
                    transform: Transform::from_str(&child.transform)?,
                    appearance: Appearance {
                        fill: parse_optional_color(&child.fill)?,
                        stroke: parse_optional_color(&child.stroke)?,
                        stroke_width: child.stroke_width,
                        opacity: Opacity::new_clamped(child.opacity),
                    },
                });
            }
            EntityKind::SvgGroup {
                children: converted,
            }
        }
    };

    let mut entity = Entity::new(doc.mirror_group_id.clone(), layer_id.to_string(), kind);
    entity.pose = Pose {
        left: fo.left,
        top: fo.top,
        scale_x: fo.scale_x,
        scale_y: fo.scale_y,
        angle: fo.angle,
        flip_x: fo.flip_x,
        flip_y: fo.flip_y,
        skew_x: fo.skew_x,
        skew_y: fo.skew_y,
        origin_x: origin_x_from_string(&fo.origin_x)?,
        origin_y: origin_y_from_string(&fo.origin_y)?,
    };
    entity.appearance = Appearance {
        fill: parse_optional_color(&fo.fill)?,
        stroke: parse_optional_color(&fo.stroke)?,
        stroke_width: fo.stroke_width,
        opacity: Opacity::new_clamped(fo.opacity),
    };
    entity.visible = fo.visible;
    entity.locked = fo.locked;
    entity.name = fo.name.clone();
    Ok(entity)
}

fn parse_optional_color(value: &Option<String>) -> Result<Option<Color>, Error> {
    match value {
        Some(text) => Ok(Some(Color::from_str(text)?)),
        None => Ok(None),
    }
}

fn transform_to_string(ts: &Transform) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        ts.a, ts.b, ts.c, ts.d, ts.e, ts.f
    )
}

fn origin_x_to_string(origin: OriginX) -> &'static str {
    match origin {
        OriginX::Left => "left",
        OriginX::Center => "center",
        OriginX::Right => "right",
    }
}

fn origin_y_to_string(origin: OriginY) -> &'static str {
    match origin {
        OriginY::Top => "top",
        OriginY::Center => "center",
        OriginY::Bottom => "bottom",
    }
}

fn origin_x_from_string(text: &str) -> Result<OriginX, Error> {
    match text {
        "left" => Ok(OriginX::Left),
        "center" => Ok(OriginX::Center),
        "right" => Ok(OriginX::Right),
        _ => Err(Error::MalformedProject(format!(
            "unknown originX '{}'",
            text
        ))),
    }
}

fn origin_y_from_string(text: &str) -> Result<OriginY, Error> {
    match text {
        "top" => Ok(OriginY::Top),
        "center" => Ok(OriginY::Center),
        "bottom" => Ok(OriginY::Bottom),
        _ => Err(Error::MalformedProject(format!(
            "unknown originY '{}'",
            text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fail() {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let err = decode("{\"version\": \"1.0.0\"}", &mut scene, &mut ids);
        assert!(matches!(err, Err(Error::MalformedProject(_))));
    }

    #[test]
    fn not_json_fails() {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        assert!(matches!(
            decode("tiles!", &mut scene, &mut ids),
            Err(Error::MalformedProject(_))
        ));
    }

    #[test]
    fn version_is_written() {
        let mut ids = IdGen::new();
        let scene = Scene::new(&mut ids);
        let text = encode(&scene, &ProjectMetadata::default()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["version"], "1.0.0");
        assert_eq!(doc["metadata"]["tileSize"], 200.0);
    }

    #[test]
    fn id_generator_bumped_on_load() {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let layer = scene.layers.first().unwrap().id.clone();
        let mut entity = Entity::new(
            "e41".to_string(),
            layer,
            EntityKind::Rect {
                width: 10.0,
                height: 10.0,
            },
        );
        entity.pose = Pose::at(250.0, 250.0);
        scene.store.add(entity);

        let text = encode(&scene, &ProjectMetadata::default()).unwrap();

        let mut fresh_ids = IdGen::new();
        let mut fresh = Scene::default();
        decode(&text, &mut fresh, &mut fresh_ids).unwrap();
        assert_eq!(fresh_ids.next_entity(), "e42");
    }
}
