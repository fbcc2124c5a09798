/// Ownership checks for posts.
///
/// Only the author may change a post. Edit requests from anyone else are
/// answered with a redirect to the post, not an error.
use crate::middleware::CurrentUser;
use crate::models::PostView;

pub fn can_edit_post(user: &CurrentUser, post: &PostView) -> bool {
    post.is_authored_by(user.id)
}
