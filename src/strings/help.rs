//! # Help Text
//!
//! Displayed to the user via the `.help` command.

pub const MAIN: &str = concat!(
    "**🤖 Renamerge Help**\n",
    "Use: .command _args_\n",
    "\n",
    "**🔀 Modes**\n",
    "* rename: Rename files and set thumbnails\n",
    "* merge: Queue files and merge them\n",
    "\n",
    "**✏️ Rename mode**\n",
    "* start\n",
    "* send a file: Rename it\n",
    "* send an image: Save as thumbnail\n",
    "* delthumb: Delete thumbnail\n",
    "\n",
    "**🧩 Merge mode**\n",
    "* start\n",
    "* send a file: Add to queue\n",
    "* done: Merge the queue\n",
    "* clear: Empty the queue\n",
    "\n",
    "**⚡ Misc**\n",
    "* status\n",
    "* help\n",
    "\n",
    "**🛡️ Admin**\n",
    "* ban [user] / unban [user]\n",
    "* banned\n",
    "* modes\n",
    "* admins\n"
);
