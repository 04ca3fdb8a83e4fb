//! Category management.
//!
//! Create and update take `multipart/form-data` with `name_en`, `name_bn`,
//! an optional `slug` (derived from the English name when blank) and an
//! optional `image` file.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;

use dokan_core::{CategoryId, LocalizedText, slugify};
use dokan_shared::db::{CategoryRepository, RepositoryError};
use dokan_shared::models::{Category, CategoryInput};

use crate::error::{AppError, Result};
use crate::forms::FormData;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

/// Text fields of a category form, validated.
async fn category_input(
    state: &AppState,
    form: &FormData,
    except: Option<CategoryId>,
    image_url: Option<String>,
) -> Result<CategoryInput> {
    let name_en = form.required("name_en")?;
    let name_bn = form.text_owned("name_bn").unwrap_or_default();
    let slug = slugify(form.text("slug").unwrap_or(&name_en));

    let input = CategoryInput {
        name: LocalizedText::new(name_en, name_bn),
        slug,
        image_url,
    };
    input.validate().map_err(AppError::BadRequest)?;

    if CategoryRepository::new(state.pool())
        .slug_taken(&input.slug, except)
        .await?
    {
        return Err(AppError::Conflict(format!(
            "A category with slug '{}' already exists",
            input.slug
        )));
    }

    Ok(input)
}

/// List all categories.
///
/// # Route
///
/// `GET /api/categories`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// Show one category.
///
/// # Route
///
/// `GET /api/categories/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Create a category, storing its image first.
///
/// # Route
///
/// `POST /api/categories`
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Category>)> {
    let mut form = FormData::from_multipart(multipart).await?;
    // Validate before uploading so a bad form leaves no stray image.
    category_input(&state, &form, None, None).await?;

    let image_url = match form.take_file("image") {
        Some(image) => Some(state.images().store(&image).await?),
        None => None,
    };

    let result = async {
        let input = category_input(&state, &form, None, image_url.clone()).await?;
        Ok::<_, AppError>(CategoryRepository::new(state.pool()).create(&input).await?)
    }
    .await;

    match result {
        Ok(category) => {
            tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
            Ok((StatusCode::CREATED, Json(category)))
        }
        Err(e) => {
            if let Some(url) = &image_url {
                state.images().delete(url).await;
            }
            Err(e)
        }
    }
}

/// Update a category. A new `image` replaces the old one, and
/// `remove_image=true` clears it.
///
/// # Route
///
/// `PUT /api/categories/{id}`
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Json<Category>> {
    let repo = CategoryRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(not_found)?;

    let mut form = FormData::from_multipart(multipart).await?;
    category_input(&state, &form, Some(id), None).await?;

    let new_image = match form.take_file("image") {
        Some(image) => Some(state.images().store(&image).await?),
        None => None,
    };
    let remove_image = form.bool("remove_image")?.unwrap_or(false);

    let image_url = match (&new_image, remove_image) {
        (Some(url), _) => Some(url.clone()),
        (None, true) => None,
        (None, false) => existing.image_url.clone(),
    };

    let result = async {
        let input = category_input(&state, &form, Some(id), image_url).await?;
        Ok::<_, AppError>(repo.update(id, &input).await?)
    }
    .await;

    match result {
        Ok(category) => {
            if let Some(old) = &existing.image_url
                && category.image_url.as_ref() != Some(old)
            {
                state.images().delete(old).await;
            }
            tracing::info!(category_id = %id, "Category updated");
            Ok(Json(category))
        }
        Err(e) => {
            if let Some(url) = &new_image {
                state.images().delete(url).await;
            }
            Err(e)
        }
    }
}

/// Delete a category. Its products stay, without a category.
///
/// # Route
///
/// `DELETE /api/categories/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    let deleted = CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(),
            other => other.into(),
        })?;

    if let Some(url) = &deleted.image_url {
        state.images().delete(url).await;
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
