use super::{
    error::PostsError,
    types::{NewPost, PostAction, PostActionForm, post_url},
};
use crate::AppState;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{error, info};

async fn render_page(
    app_state: &AppState,
    template: &str,
    status: StatusCode,
    mut globals: liquid::Object,
) -> Response {
    globals.insert(
        "app_name".into(),
        liquid::model::Value::scalar(app_state.config.app.name.clone()),
    );

    match app_state
        .template_engine
        .render_template(template, globals)
        .await
    {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

async fn post_not_found(app_state: &AppState, id: &str) -> Response {
    info!("Post not found: {}", id);

    let config = app_state.forum.get_config();
    let globals = liquid::object!({
        "post_id": id,
        "page_title": "Post not found",
    });

    let response = render_page(
        app_state,
        &config.not_found_template,
        StatusCode::NOT_FOUND,
        globals,
    )
    .await;

    if response.status() == StatusCode::NOT_FOUND {
        response
    } else {
        (StatusCode::NOT_FOUND, "Post not found").into_response()
    }
}

pub async fn home_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let posts = match app_state.forum.list_posts().await {
        Ok(posts) => posts,
        Err(e) => {
            error!("Failed to list posts: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list posts").into_response();
        }
    };

    let config = app_state.forum.get_config();
    let globals = liquid::object!({
        "posts": posts,
        "page_title": "Home",
    });

    render_page(&app_state, &config.index_template, StatusCode::OK, globals).await
}

pub async fn create_post_form_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let config = app_state.forum.get_config();
    let globals = liquid::object!({
        "page_title": "Create post",
    });

    render_page(&app_state, &config.create_template, StatusCode::OK, globals).await
}

pub async fn create_post_handler(
    State(app_state): State<AppState>,
    Form(new_post): Form<NewPost>,
) -> impl IntoResponse {
    match app_state.forum.create_post(new_post).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => {
            error!("Failed to create post: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create post").into_response()
        }
    }
}

pub async fn post_detail_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let post = match app_state.forum.get_post(&id).await {
        Ok(Some(post)) => post,
        Ok(None) => return post_not_found(&app_state, &id).await,
        Err(e) => {
            error!("Failed to load post {}: {}", id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load post").into_response();
        }
    };

    let config = app_state.forum.get_config();
    let comment_count = post.comment_count();
    let globals = liquid::object!({
        "post": {
            "id": post.id,
            "title": post.title,
            "content": post.content,
            "author": post.author,
            "timestamp": post.timestamp,
            "likes": post.likes,
            "comments": post.comments,
            "comment_count": comment_count,
            "url": post_url(&post.id),
        },
        "page_title": post.title,
    });

    render_page(&app_state, &config.post_template, StatusCode::OK, globals).await
}

pub async fn post_action_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PostActionForm>,
) -> impl IntoResponse {
    let action = PostAction::from(form);

    match app_state.forum.apply_action(&id, action).await {
        Ok(_) => Redirect::to(&post_url(&id)).into_response(),
        Err(PostsError::PostNotFound(_)) => post_not_found(&app_state, &id).await,
        Err(e) => {
            error!("Failed to update post {}: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update post").into_response()
        }
    }
}
