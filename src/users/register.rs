use axum::{debug_handler, extract::{Multipart, State}, Json};
use serde_json::{json, Value};

use super::{Document, Registered, Registration, UserService};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[debug_handler(state = AppState)]
pub(crate) async fn crear_usuario(
    State(users): State<UserService>,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let req = read_form(multipart).await?;
    let outcome = users.register(req).await?;

    let message = match &outcome {
        Registered::Created(_) => "Usuario registrado con éxito",
        Registered::RoleAdded(_) => "Rol agregado al usuario existente",
    };
    Ok(Json(json!({ "message": message, "uid": outcome.uid() })))
}

async fn read_form(mut multipart: Multipart) -> AppResult<Registration> {
    let mut email = None;
    let mut password = None;
    let mut role = None;
    let mut name = None;
    let mut surname = None;
    let mut phone = None;
    let mut address = None;
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field_name.as_str() {
            "archivo_pdf" => {
                let filename = field
                    .file_name()
                    .unwrap_or("archivo.pdf")
                    .to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/pdf")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();
                document = Some(Document { filename, content_type, bytes });
            }
            other => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match other {
                    "email" => email = Some(text),
                    "password" => password = Some(text),
                    "tipo_usuario" => role = Some(text),
                    "nombre" => name = Some(text),
                    "apellido" => surname = Some(text),
                    "telefono" => phone = Some(text),
                    "direccion" => address = Some(text),
                    _ => {}
                }
            }
        }
    }

    Ok(Registration {
        email: required(email, "email")?,
        password: required(password, "password")?,
        role: required(role, "tipo_usuario")?,
        name: required(name, "nombre")?,
        surname: required(surname, "apellido")?,
        phone: required(phone, "telefono")?,
        // browsers send the field empty when left blank
        address: address.filter(|a| !a.is_empty()),
        document,
    })
}

fn required(value: Option<String>, name: &'static str) -> AppResult<String> {
    value.ok_or_else(|| AppError::BadRequest(format!("falta el campo {name}")))
}
