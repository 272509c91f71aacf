//! JSON command protocol for scripting the builder.
//!
//! Pointer commands take grid coordinates and cast a vertical ray there,
//! so scripts do not depend on the camera. Objects are addressed by their
//! short numeric id as reported by `inspect`.

use serde::{Deserialize, Serialize};
use shared::{format_hex_color, parse_hex_color, ShapeKind};

use crate::render::NavigationControl;
use crate::state::{node_from_script_id, script_id, Editor, InteractionMode, NodeId};
use crate::viewport::picking::Ray;

/// A command a script can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BuilderCommand {
    /// Enter placement mode with a shape.
    BeginPlacement { shape: ShapeKind },
    /// Change the shape used by placement.
    SetShape { shape: ShapeKind },
    CancelPlacement,
    PointerMove { x: f32, z: f32 },
    PointerDown { x: f32, z: f32 },
    PointerUp,
    Click { x: f32, z: f32 },
    DoubleClick { x: f32, z: f32 },
    /// Begin placement, hover and click in one step.
    Place { shape: ShapeKind, x: f32, z: f32 },
    /// Select by the id `place` or `inspect` reported, or clear with `null`.
    Select { id: Option<u64> },
    /// Edit the inspector draft and apply it. Omitted fields keep the draft.
    Apply {
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        metalness: Option<f32>,
        #[serde(default)]
        roughness: Option<f32>,
        #[serde(default)]
        opacity: Option<f32>,
        #[serde(default)]
        transparent: Option<bool>,
        #[serde(default)]
        scale: Option<[f32; 3]>,
        #[serde(default)]
        rotation_y: Option<f32>,
    },
    DeleteSelected,
    /// List placed objects and the interaction state.
    Inspect,
    /// Render the HTML document.
    ExportScene,
    /// Remove every placed object.
    Clear,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

fn id_json(id: Option<NodeId>) -> serde_json::Value {
    id.map_or(serde_json::Value::Null, |id| serde_json::json!(script_id(id)))
}

fn mode_name(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Idle => "idle",
        InteractionMode::Placing => "placing",
        InteractionMode::Dragging { .. } => "dragging",
    }
}

/// Execute a single command on the editor.
pub fn execute_command<N: NavigationControl>(editor: &mut Editor<N>, cmd: BuilderCommand) -> CommandResponse {
    match cmd {
        BuilderCommand::BeginPlacement { shape } => {
            editor.begin_placement(shape);
            CommandResponse::ok()
        }

        BuilderCommand::SetShape { shape } => {
            editor.set_shape(shape);
            CommandResponse::ok()
        }

        BuilderCommand::CancelPlacement => {
            editor.cancel_placement();
            CommandResponse::ok()
        }

        BuilderCommand::PointerMove { x, z } => {
            editor.pointer_move(&Ray::down_at(x, z));
            CommandResponse::ok()
        }

        BuilderCommand::PointerDown { x, z } => {
            editor.pointer_down(&Ray::down_at(x, z));
            CommandResponse::ok_with_data(serde_json::json!({
                "dragging": editor.interaction.is_dragging(),
            }))
        }

        BuilderCommand::PointerUp => {
            editor.pointer_up();
            CommandResponse::ok()
        }

        BuilderCommand::Click { x, z } => {
            let id = editor.click(&Ray::down_at(x, z));
            CommandResponse::ok_with_data(serde_json::json!({ "id": id_json(id) }))
        }

        BuilderCommand::DoubleClick { x, z } => {
            let id = editor.double_click(&Ray::down_at(x, z));
            CommandResponse::ok_with_data(serde_json::json!({ "deleted": id_json(id) }))
        }

        BuilderCommand::Place { shape, x, z } => {
            editor.begin_placement(shape);
            let ray = Ray::down_at(x, z);
            editor.pointer_move(&ray);
            match editor.click(&ray) {
                Some(id) => CommandResponse::ok_with_data(serde_json::json!({
                    "id": script_id(id),
                    "position": editor.scene.get(id).map(|n| n.transform.position),
                })),
                None => {
                    editor.cancel_placement();
                    CommandResponse::err(format!("({x}, {z}) is off the ground"))
                }
            }
        }

        BuilderCommand::Select { id: None } => {
            editor.select(None);
            CommandResponse::ok()
        }

        BuilderCommand::Select { id: Some(wanted) } => {
            let id = node_from_script_id(wanted);
            if !editor.scene.is_placed(id) {
                return CommandResponse::err(format!("No object with id {wanted}"));
            }
            editor.select(Some(id));
            CommandResponse::ok()
        }

        BuilderCommand::Apply {
            color,
            metalness,
            roughness,
            opacity,
            transparent,
            scale,
            rotation_y,
        } => {
            if editor.inspector.live_target(&editor.scene).is_none() {
                return CommandResponse::err("Nothing selected");
            }
            let draft = &mut editor.inspector.draft;
            if let Some(hex) = color {
                match parse_hex_color(&hex) {
                    Some(c) => draft.color = c,
                    None => return CommandResponse::err(format!("Invalid color: {hex}")),
                }
            }
            if let Some(v) = metalness {
                draft.metalness = v.clamp(0.0, 1.0);
            }
            if let Some(v) = roughness {
                draft.roughness = v.clamp(0.0, 1.0);
            }
            if let Some(v) = opacity {
                draft.opacity = v.clamp(0.0, 1.0);
            }
            if let Some(v) = transparent {
                draft.transparent = v;
            }
            if let Some(v) = scale {
                draft.scale = v;
            }
            if let Some(v) = rotation_y {
                draft.rotation_y_degrees = v;
            }
            editor.apply_inspector();
            CommandResponse::ok()
        }

        BuilderCommand::DeleteSelected => {
            let deleted = editor.delete_selected();
            CommandResponse::ok_with_data(serde_json::json!({ "deleted": deleted }))
        }

        BuilderCommand::Inspect => {
            let objects: Vec<serde_json::Value> = editor
                .scene
                .placed()
                .map(|(id, node)| {
                    serde_json::json!({
                        "id": script_id(id),
                        "shape": node.shape().map(|s| s.tag()),
                        "position": node.transform.position,
                        "scale": node.transform.scale,
                        "rotation": node.transform.rotation,
                        "color": format_hex_color(node.material.color),
                        "transparent": node.material.transparent,
                    })
                })
                .collect();
            CommandResponse::ok_with_data(serde_json::json!({
                "mode": mode_name(editor.mode()),
                "selected": id_json(editor.selected()),
                "object_count": objects.len(),
                "objects": objects,
            }))
        }

        BuilderCommand::ExportScene => match editor.export() {
            Ok(doc) => CommandResponse::ok_with_data(serde_json::json!({
                "html": doc.html,
                "records": doc.records,
            })),
            Err(e) => CommandResponse::err(e.to_string()),
        },

        BuilderCommand::Clear => {
            let removed = editor.clear();
            CommandResponse::ok_with_data(serde_json::json!({ "removed": removed }))
        }
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json<N: NavigationControl>(editor: &mut Editor<N>, json: &str) -> Result<CommandResponse, String> {
    let cmd: BuilderCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(editor, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch<N: NavigationControl>(
    editor: &mut Editor<N>,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<BuilderCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(editor, cmd))
        .collect())
}
