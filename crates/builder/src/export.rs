//! Scene export to a standalone HTML page.
//!
//! Placed objects are snapshotted into [`ObjectRecord`]s, in scene order,
//! and embedded as JSON next to a small three.js program that rebuilds them
//! with the same geometry constructors the builder uses. Uploaded and local
//! textures are written next to the page and referenced by relative path,
//! or inlined as `data:` URLs for a single-file export.

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use shared::{MaterialRecord, ObjectRecord, ShapeKind};

use crate::state::scene::SceneGraph;
use crate::state::settings::{AppSettings, ExportSettings};
use crate::texture::TextureSource;

/// Id of the script element holding the record array
const DATA_ELEMENT_ID: &str = "scene-data";
/// Folder for uploaded textures, relative to the document
const TEXTURE_DIR: &str = "textures";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document has no embedded scene data")]
    MissingSceneData,
}

/// A file written alongside the document.
#[derive(Debug, Clone)]
pub struct ExportAsset {
    /// Path relative to the document's directory
    pub path: String,
    pub bytes: Arc<[u8]>,
}

/// The exported page plus everything it references locally.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub html: String,
    pub records: Vec<ObjectRecord>,
    pub assets: Vec<ExportAsset>,
}

/// Snapshot placed objects into records, materializing textures that live
/// in memory or on disk as assets under `textures/`.
pub fn snapshot(scene: &SceneGraph) -> (Vec<ObjectRecord>, Vec<ExportAsset>) {
    let mut records = Vec::new();
    let mut assets = Vec::new();

    for (index, (_, node)) in scene.placed().enumerate() {
        let Some(shape) = node.shape() else { continue };
        let map = node
            .texture
            .as_ref()
            .map(|tex| texture_map(index, &tex.source, &mut assets));

        records.push(ObjectRecord {
            shape,
            position: node.transform.position,
            scale: node.transform.scale,
            rotation: node.transform.rotation,
            material: MaterialRecord::from_material(&node.material, map),
        });
    }

    (records, assets)
}

/// The `map` locator for a texture, pushing its bytes to `assets` when the
/// document has to carry them.
fn texture_map(index: usize, source: &TextureSource, assets: &mut Vec<ExportAsset>) -> String {
    let (name, bytes): (&str, Arc<[u8]>) = match source {
        TextureSource::Upload { name, bytes, .. } => (name.as_str(), bytes.clone()),
        TextureSource::Locator {
            locator,
            path: Some(path),
        } => match std::fs::read(path) {
            Ok(bytes) => (strip_index_prefix(locator), Arc::from(bytes)),
            Err(e) => {
                // Keep the reference so the record survives; the page will miss the file
                tracing::warn!("Texture {} unreadable, exporting its locator: {e}", path.display());
                return locator.clone();
            }
        },
        TextureSource::Locator { locator, path: None } => return locator.clone(),
    };

    let path = format!("{TEXTURE_DIR}/{index}-{}", sanitize_file_name(name));
    assets.push(ExportAsset {
        path: path.clone(),
        bytes,
    });
    path
}

/// File name of a locator without the `<index>-` prefix a previous export added.
fn strip_index_prefix(locator: &str) -> &str {
    let name = locator.rsplit(['/', '\\']).next().unwrap_or(locator);
    match name.split_once('-') {
        Some((index, rest)) if !index.is_empty() && !rest.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => rest,
        _ => name,
    }
}

/// Export the scene as a document.
pub fn export_scene(scene: &SceneGraph, settings: &AppSettings) -> Result<ExportedDocument, ExportError> {
    let (records, assets) = snapshot(scene);
    let html = render_html(&records, settings)?;
    tracing::info!("Exported {} objects, {} textures", records.len(), assets.len());
    Ok(ExportedDocument { html, records, assets })
}

/// Export the scene as a single page: asset textures are embedded as
/// base64 `data:` URLs, so the document has no companion files.
pub fn export_self_contained(scene: &SceneGraph, settings: &AppSettings) -> Result<ExportedDocument, ExportError> {
    let (mut records, assets) = snapshot(scene);
    for record in &mut records {
        let Some(map) = record.material.map.as_mut() else { continue };
        if let Some(asset) = assets.iter().find(|asset| asset.path == *map) {
            *map = data_url(&asset.bytes);
        }
    }
    let html = render_html(&records, settings)?;
    tracing::info!("Exported {} objects, {} textures inlined", records.len(), assets.len());
    Ok(ExportedDocument {
        html,
        records,
        assets: Vec::new(),
    })
}

fn data_url(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Write the document to `path` and its assets next to it.
pub fn write_document(path: &Path, doc: &ExportedDocument) -> Result<(), ExportError> {
    std::fs::write(path, &doc.html)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for asset in &doc.assets {
        let target = dir.join(&asset.path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &asset.bytes)?;
    }
    tracing::info!("Scene written to {}", path.display());
    Ok(())
}

/// Extract the record array embedded in an exported document.
pub fn parse_document(html: &str) -> Result<Vec<ObjectRecord>, ExportError> {
    let marker = format!("id=\"{DATA_ELEMENT_ID}\"");
    let tag_start = html.find(&marker).ok_or(ExportError::MissingSceneData)?;
    let body_start = html[tag_start..]
        .find('>')
        .map(|i| tag_start + i + 1)
        .ok_or(ExportError::MissingSceneData)?;
    let body_len = html[body_start..]
        .find("</script>")
        .ok_or(ExportError::MissingSceneData)?;
    Ok(serde_json::from_str(&html[body_start..body_start + body_len])?)
}

/// Read an exported document from disk.
pub fn read_document(path: &Path) -> Result<Vec<ObjectRecord>, ExportError> {
    parse_document(&std::fs::read_to_string(path)?)
}

/// Render the page for `records`.
pub fn render_html(records: &[ObjectRecord], settings: &AppSettings) -> Result<String, ExportError> {
    let ExportSettings {
        title,
        three_module_url,
        orbit_controls_url,
        ..
    } = &settings.export;
    let [r, g, b] = settings.viewport.background_color;
    let [cx, cy, cz] = settings.camera.position;

    let values = [
        ("TITLE", escape_html(title)),
        ("THREE_URL", js_string(three_module_url)?),
        ("ORBIT_URL", js_string(orbit_controls_url)?),
        ("BACKGROUND", format!("0x{r:02x}{g:02x}{b:02x}")),
        ("FOV", settings.camera.fov_degrees.to_string()),
        ("NEAR", settings.camera.near.to_string()),
        ("FAR", settings.camera.far.to_string()),
        ("CAMERA", format!("{cx}, {cy}, {cz}")),
        ("GRID_SIZE", settings.grid.size.to_string()),
        ("GRID_DIVISIONS", settings.grid.divisions.to_string()),
        ("GEOMETRY_CASES", geometry_cases()),
        ("DATA_ID", DATA_ELEMENT_ID.to_string()),
        ("SCENE_DATA", escape_script(&serde_json::to_string_pretty(records)?)),
    ];
    Ok(fill_template(PAGE_TEMPLATE, &values))
}

/// Substitute `{{NAME}}` placeholders in one pass. Substituted text is
/// never scanned again; unknown placeholders are kept as written.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after
            .find("}}")
            .and_then(|end| values.iter().find(|(name, _)| *name == &after[..end]).map(|(_, v)| (end, v)));
        match value {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// One `case` per shape, matching the builder's fixed constructors.
fn geometry_cases() -> String {
    ShapeKind::ALL
        .iter()
        .map(|shape| {
            let ctor = match shape {
                ShapeKind::Box => "new THREE.BoxGeometry(1, 1, 1)",
                ShapeKind::Sphere => "new THREE.SphereGeometry(0.5, 32, 32)",
                ShapeKind::Cylinder => "new THREE.CylinderGeometry(0.5, 0.5, 1, 32)",
                ShapeKind::TorusKnot => "new THREE.TorusKnotGeometry(0.4, 0.15, 100, 16)",
            };
            format!("        case '{}': return {};", shape.tag(), ctor)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep `</script>` inside JSON from closing the element. `<\/` is still valid JSON.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn js_string(s: &str) -> Result<String, ExportError> {
    Ok(escape_script(&serde_json::to_string(s)?))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reduce an uploaded file name to a safe relative file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "texture".to_string()
    } else {
        cleaned.to_string()
    }
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>{{TITLE}}</title>
  <style>
    body { margin: 0; overflow: hidden; }
    canvas { display: block; }
  </style>
</head>
<body>
  <script id="{{DATA_ID}}" type="application/json">{{SCENE_DATA}}</script>
  <script type="module">
    import * as THREE from {{THREE_URL}};
    import { OrbitControls } from {{ORBIT_URL}};

    const scene = new THREE.Scene();
    scene.background = new THREE.Color({{BACKGROUND}});

    const camera = new THREE.PerspectiveCamera({{FOV}}, innerWidth / innerHeight, {{NEAR}}, {{FAR}});
    camera.position.set({{CAMERA}});

    const renderer = new THREE.WebGLRenderer({ antialias: true });
    renderer.setSize(innerWidth, innerHeight);
    document.body.appendChild(renderer.domElement);

    const controls = new OrbitControls(camera, renderer.domElement);
    controls.enableDamping = true;

    const light = new THREE.DirectionalLight(0xffffff, 1);
    light.position.set(0, 10, 0);
    scene.add(light);
    scene.add(new THREE.AmbientLight(0xffffff, 0.5));

    scene.add(new THREE.GridHelper({{GRID_SIZE}}, {{GRID_DIVISIONS}}));

    const objects = JSON.parse(document.getElementById('{{DATA_ID}}').textContent);
    const loader = new THREE.TextureLoader();

    const makeGeometry = (shape) => {
      switch (shape) {
{{GEOMETRY_CASES}}
        default: return null;
      }
    };

    for (const obj of objects) {
      const geometry = makeGeometry(obj.shape);
      if (!geometry) continue;

      const m = obj.material;
      const material = new THREE.MeshStandardMaterial({
        color: m.color,
        metalness: m.metalness,
        roughness: m.roughness,
        opacity: m.opacity,
        transparent: m.transparent,
        wireframe: m.wireframe,
        depthWrite: !m.transparent,
      });
      if (m.map) {
        loader.load(m.map, (texture) => {
          material.map = texture;
          material.needsUpdate = true;
        });
      }

      const mesh = new THREE.Mesh(geometry, material);
      mesh.position.fromArray(obj.position);
      mesh.scale.fromArray(obj.scale);
      mesh.rotation.set(obj.rotation[0], obj.rotation[1], obj.rotation[2]);
      scene.add(mesh);
    }

    addEventListener('resize', () => {
      camera.aspect = innerWidth / innerHeight;
      camera.updateProjectionMatrix();
      renderer.setSize(innerWidth, innerHeight);
    });

    renderer.setAnimationLoop(() => {
      controls.update();
      renderer.render(scene, camera);
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use crate::state::settings::GridSettings;
    use crate::texture::TextureRef;
    use shared::{Material, Transform};

    fn scene() -> SceneGraph {
        SceneGraph::with_fixtures(Box::new(HeadlessBackend::new()), &GridSettings::default())
    }

    #[test]
    fn test_empty_scene_exports_empty_array() {
        let doc = export_scene(&scene(), &AppSettings::default()).unwrap();
        assert!(doc.records.is_empty());
        assert_eq!(parse_document(&doc.html).unwrap(), vec![]);
    }

    #[test]
    fn test_only_placed_objects_are_exported() {
        let mut scene = scene();
        scene.add(
            crate::state::scene::NodeKind::Ghost(ShapeKind::Box),
            Transform::new(),
            Material::preview(),
        );
        scene.add_placed(ShapeKind::Sphere, Transform::at([1.0, 0.5, 0.0]), Material::placed());

        let (records, _) = snapshot(&scene);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].shape, ShapeKind::Sphere);
        assert_eq!(records[0].position, [1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_records_follow_scene_order() {
        let mut scene = scene();
        for shape in [ShapeKind::TorusKnot, ShapeKind::Box, ShapeKind::Cylinder] {
            scene.add_placed(shape, Transform::new(), Material::placed());
        }
        let shapes: Vec<ShapeKind> = snapshot(&scene).0.iter().map(|r| r.shape).collect();
        assert_eq!(shapes, vec![ShapeKind::TorusKnot, ShapeKind::Box, ShapeKind::Cylinder]);
    }

    #[test]
    fn test_html_contains_bootstrap() {
        let html = render_html(&[], &AppSettings::default()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>My 3D Scene</title>"));
        assert!(html.contains("import * as THREE from \"https://cdn.skypack.dev/three@0.152.2\";"));
        assert!(html.contains("case 'torusknot': return new THREE.TorusKnotGeometry(0.4, 0.15, 100, 16);"));
        assert!(html.contains("new THREE.GridHelper(30, 30)"));
        assert!(html.contains("new THREE.Color(0xf0f0f0)"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_script_breakout_is_escaped() {
        let mut scene = scene();
        let id = scene.add_placed(ShapeKind::Box, Transform::new(), Material::placed());
        let evil = "https://x.test/</script><script>alert(1)</script>.png";
        scene.set_texture(
            id,
            Some(TextureRef {
                source: TextureSource::from_locator(evil, None),
                size: None,
                average_color: None,
            }),
        );

        let doc = export_scene(&scene, &AppSettings::default()).unwrap();
        assert_eq!(doc.html.matches("</script>").count(), 2);
        let records = parse_document(&doc.html).unwrap();
        assert_eq!(records[0].material.map.as_deref(), Some(evil));
    }

    #[test]
    fn test_uploaded_texture_becomes_asset() {
        let mut scene = scene();
        scene.add_placed(ShapeKind::Box, Transform::new(), Material::placed());
        let id = scene.add_placed(ShapeKind::Box, Transform::new(), Material::placed());
        scene.set_texture(
            id,
            Some(TextureRef {
                source: TextureSource::upload("../my wood.png", vec![1u8, 2, 3]),
                size: Some([1, 1]),
                average_color: None,
            }),
        );

        let (records, assets) = snapshot(&scene);
        assert_eq!(records[0].material.map, None);
        assert_eq!(records[1].material.map.as_deref(), Some("textures/1-my_wood.png"));
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].path, "textures/1-my_wood.png");
        assert_eq!(&*assets[0].bytes, &[1u8, 2, 3]);
    }

    #[test]
    fn test_write_document_with_assets() {
        let dir = std::env::temp_dir().join(format!("scene-builder-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let doc = ExportedDocument {
            html: render_html(&[], &AppSettings::default()).unwrap(),
            records: vec![],
            assets: vec![ExportAsset {
                path: "textures/0-a.png".to_string(),
                bytes: Arc::from(vec![7u8, 7]),
            }],
        };
        let path = dir.join("scene.html");
        write_document(&path, &doc).unwrap();

        assert!(read_document(&path).unwrap().is_empty());
        assert_eq!(std::fs::read(dir.join("textures/0-a.png")).unwrap(), vec![7u8, 7]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_parse_rejects_foreign_html() {
        let result = parse_document("<html><body>hello</body></html>");
        assert!(matches!(result, Err(ExportError::MissingSceneData)));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut settings = AppSettings::default();
        settings.export.title = "<Cats & Dogs>".to_string();
        let html = render_html(&[], &settings).unwrap();
        assert!(html.contains("<title>&lt;Cats &amp; Dogs&gt;</title>"));
    }

    #[test]
    fn test_local_texture_is_copied_as_asset() {
        let dir = std::env::temp_dir().join(format!("scene-builder-local-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("textures")).unwrap();
        std::fs::write(dir.join("textures/3-wood.png"), [4u8, 5, 6]).unwrap();

        let mut scene = scene();
        let found = scene.add_placed(ShapeKind::Box, Transform::new(), Material::placed());
        let missing = scene.add_placed(ShapeKind::Box, Transform::new(), Material::placed());
        for (id, locator) in [(found, "textures/3-wood.png"), (missing, "textures/gone.png")] {
            let source = TextureSource::from_locator(locator, Some(dir.as_path()));
            scene.set_texture(id, Some(TextureRef::unresolved(source)));
        }

        let (records, assets) = snapshot(&scene);
        assert_eq!(records[0].material.map.as_deref(), Some("textures/0-wood.png"));
        assert_eq!(records[1].material.map.as_deref(), Some("textures/gone.png"));
        assert_eq!(assets.len(), 1);
        assert_eq!(&*assets[0].bytes, &[4u8, 5, 6]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_strip_index_prefix() {
        assert_eq!(strip_index_prefix("textures/12-wood.png"), "wood.png");
        assert_eq!(strip_index_prefix("textures/dark-wood.png"), "dark-wood.png");
        assert_eq!(strip_index_prefix("7-.png"), "7-.png");
        assert_eq!(strip_index_prefix("C:\\pics\\cat.jpg"), "cat.jpg");
    }

    #[test]
    fn test_self_contained_inlines_uploads() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let mut scene = scene();
        let id = scene.add_placed(ShapeKind::Sphere, Transform::new(), Material::placed());
        let upload = TextureSource::upload("grey.png", png.into_inner());
        scene.set_texture(id, Some(TextureRef::unresolved(upload)));

        let doc = export_self_contained(&scene, &AppSettings::default()).unwrap();
        assert!(doc.assets.is_empty());
        let map = doc.records[0].material.map.clone().unwrap();
        assert!(map.starts_with("data:image/png;base64,"), "{map}");
        assert_eq!(parse_document(&doc.html).unwrap(), doc.records);

        // The inlined page decodes back to the same pixels
        let tex = crate::texture::decode(TextureSource::from_locator(&map, None)).unwrap();
        assert_eq!(tex.average_color, Some([9, 9, 9]));
    }

    #[test]
    fn test_placeholders_in_values_stay_literal() {
        let mut settings = AppSettings::default();
        settings.export.title = "{{SCENE_DATA}} and {{DATA_ID}}".to_string();
        settings.export.orbit_controls_url = "https://x.test/{{THREE_URL}}.js".to_string();
        let records = vec![ObjectRecord {
            shape: ShapeKind::Box,
            position: [0.0, 0.5, 0.0],
            scale: [1.0; 3],
            rotation: [0.0; 3],
            material: MaterialRecord::from_material(&Material::placed(), None),
        }];

        let html = render_html(&records, &settings).unwrap();
        assert!(html.contains("<title>{{SCENE_DATA}} and {{DATA_ID}}</title>"));
        assert!(html.contains("\"https://x.test/{{THREE_URL}}.js\""));
        assert_eq!(html.matches("id=\"scene-data\"").count(), 1);
        assert_eq!(parse_document(&html).unwrap(), records);
    }

    #[test]
    fn test_fill_template_keeps_unknown_names() {
        let values = [("A", "{{B}}".to_string()), ("B", "b".to_string())];
        assert_eq!(fill_template("{{A}} {{B}} {{C}} {{", &values), "{{B}} b {{C}} {{");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("C:\\pics\\cat.jpg"), "cat.jpg");
        assert_eq!(sanitize_file_name("..."), "texture");
        assert_eq!(sanitize_file_name("a b?.png"), "a_b_.png");
    }
}
