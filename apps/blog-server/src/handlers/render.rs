//! Domain types rendered as wire view models.

use blogicum_core::Page;
use blogicum_core::domain::{Category, Comment, Location, Post, PostLabels, PostSummary, User};
use blogicum_shared::dto::{
    CategoryResponse, CommentResponse, LocationResponse, PageResponse, PostRequest, PostResponse,
    ProfileRequest, ProfileResponse, UserResponse,
};

pub fn post(post: Post, labels: PostLabels, comment_count: u64) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        author_id: post.author_id,
        author_username: labels.author_username,
        category_id: post.category_id,
        category_title: labels.category_title,
        location_id: post.location_id,
        location_name: labels.location_name,
        image: post.image,
        is_published: post.is_published,
        created_at: post.created_at,
        comment_count,
    }
}

pub fn summary(summary: PostSummary) -> PostResponse {
    post(summary.post, summary.labels, summary.comment_count)
}

/// A post as the initial data of its edit form.
pub fn post_form(post: Post) -> PostRequest {
    PostRequest {
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        location_id: post.location_id,
        category_id: post.category_id,
        image: post.image,
        is_published: post.is_published,
    }
}

pub fn page<T, U>(page: Page<T>, render: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    PageResponse {
        number: page.number,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
        has_next,
        has_previous,
        items: page.items.into_iter().map(render).collect(),
    }
}

pub fn comment(comment: Comment, author_username: String) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author_id: comment.author_id,
        author_username,
        text: comment.text,
        created_at: comment.created_at,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
        is_published: category.is_published,
    }
}

pub fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
        is_published: location.is_published,
    }
}

/// Public profile. The email stays private.
pub fn profile(user: User) -> ProfileResponse {
    ProfileResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        date_joined: user.created_at,
    }
}

pub fn profile_form(user: User) -> ProfileRequest {
    ProfileRequest {
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
    }
}

pub fn user(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        is_staff: user.is_staff,
        created_at: user.created_at,
    }
}
